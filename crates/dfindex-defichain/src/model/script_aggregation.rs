use dfindex_core::error::IndexerError;
use dfindex_core::keys;
use dfindex_core::store::Entity;
use dfindex_core::types::{format_sats, parse_sats, BlockContext};
use serde::{Deserialize, Serialize};

use super::Script;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptAggregationStatistic {
    pub tx_count: u64,
    pub tx_in_count: u64,
    pub tx_out_count: u64,
}

/// Cumulative amounts, as 8-decimal coin strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptAggregationAmount {
    pub tx_in: String,
    pub tx_out: String,
    pub unspent: String,
}

impl Default for ScriptAggregationAmount {
    fn default() -> Self {
        Self {
            tx_in: format_sats(0),
            tx_out: format_sats(0),
            unspent: format_sats(0),
        }
    }
}

/// Running totals for a script as of the end of `block`.
///
/// `txIn` counts value received (vouts paying the script), `txOut` counts
/// value spent (vins consuming its outputs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptAggregationModel {
    pub id: String,
    pub hid: String,
    pub block: BlockContext,
    pub script: Script,
    pub statistic: ScriptAggregationStatistic,
    pub amount: ScriptAggregationAmount,
    pub sort: String,
}

impl ScriptAggregationModel {
    /// An empty row for `hid` at `block`.
    pub fn empty(hid: &str, block: BlockContext, script: Script) -> Result<Self, IndexerError> {
        let sort = keys::encode_height(block.height)?;
        Ok(Self {
            id: format!("{sort}{hid}"),
            hid: hid.to_string(),
            block,
            script,
            statistic: ScriptAggregationStatistic::default(),
            amount: ScriptAggregationAmount::default(),
            sort,
        })
    }

    pub fn id_of(height: u64, hid: &str) -> Result<String, IndexerError> {
        Ok(format!("{}{hid}", keys::encode_height(height)?))
    }

    /// `(txIn, txOut)` in satoshis.
    pub fn amounts_sats(&self) -> Result<(i64, i64), IndexerError> {
        let parse = |s: &str| {
            parse_sats(s).ok_or_else(|| {
                IndexerError::Other(format!("aggregation {} has invalid amount '{s}'", self.id))
            })
        };
        Ok((parse(&self.amount.tx_in)?, parse(&self.amount.tx_out)?))
    }

    /// Replace the amounts, deriving `unspent = txIn - txOut`.
    pub fn set_amounts(&mut self, tx_in: i64, tx_out: i64) -> Result<(), IndexerError> {
        let unspent = tx_in.checked_sub(tx_out).ok_or_else(|| {
            IndexerError::Other(format!("aggregation {} unspent overflows", self.id))
        })?;
        self.amount = ScriptAggregationAmount {
            tx_in: format_sats(tx_in),
            tx_out: format_sats(tx_out),
            unspent: format_sats(unspent),
        };
        Ok(())
    }
}

/// `total + amount` in satoshis, failing instead of wrapping.
pub fn add_sats(total: i64, amount: i64, what: &str) -> Result<i64, IndexerError> {
    total
        .checked_add(amount)
        .ok_or_else(|| IndexerError::Other(format!("{what} overflows at {total} + {amount} sats")))
}

impl Entity for ScriptAggregationModel {
    const KIND: &'static str = "script_aggregation";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn partition_key(&self) -> String {
        self.hid.clone()
    }

    fn sort_key(&self) -> String {
        self.sort.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(height: u64) -> BlockContext {
        BlockContext {
            hash: "bb".into(),
            height,
            time: 0,
            median_time: 0,
        }
    }

    #[test]
    fn id_is_height_then_hid() {
        let row = ScriptAggregationModel::empty("ab", block(16), Script::default()).unwrap();
        assert_eq!(row.id, "00000010ab");
        assert_eq!(row.sort, "00000010");
        assert_eq!(row.id, ScriptAggregationModel::id_of(16, "ab").unwrap());
    }

    #[test]
    fn unspent_is_derived() {
        let mut row = ScriptAggregationModel::empty("ab", block(1), Script::default()).unwrap();
        row.set_amounts(150_000_000, 50_000_000).unwrap();
        assert_eq!(row.amount.tx_in, "1.50000000");
        assert_eq!(row.amount.tx_out, "0.50000000");
        assert_eq!(row.amount.unspent, "1.00000000");
        assert_eq!(row.amounts_sats().unwrap(), (150_000_000, 50_000_000));
    }

    #[test]
    fn overflowing_totals_are_errors() {
        assert_eq!(add_sats(1, 2, "txIn").unwrap(), 3);
        let err = add_sats(i64::MAX, 1, "txIn").unwrap_err();
        assert!(err.to_string().contains("txIn overflows"), "got {err}");

        let mut row = ScriptAggregationModel::empty("ab", block(1), Script::default()).unwrap();
        assert!(row.set_amounts(i64::MIN, 1).is_err());
        assert_eq!(row.amount, ScriptAggregationAmount::default());
    }
}

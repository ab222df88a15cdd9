//! Per-script running totals, one row per block the script is touched in.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use dfindex_core::error::IndexerError;
use dfindex_core::indexer::Indexer;
use dfindex_core::keys;
use dfindex_core::store::QueryOptions;
use dfindex_core::types::{BlockContext, RawBlock, RawVin};
use tracing::debug;

use super::VoutFinder;
use crate::database::Store;
use crate::model::{add_sats, Script, ScriptAggregationModel, TransactionVoutModel};

/// What one block changes for one script.
struct Delta {
    script: Script,
    txids: HashSet<String>,
    tx_in_count: u64,
    tx_out_count: u64,
    tx_in: i64,
    tx_out: i64,
}

impl Delta {
    fn new(script: Script) -> Self {
        Self {
            script,
            txids: HashSet::new(),
            tx_in_count: 0,
            tx_out_count: 0,
            tx_in: 0,
            tx_out: 0,
        }
    }
}

pub struct ScriptAggregationIndexer {
    aggregations: Store<ScriptAggregationModel>,
    finder: VoutFinder,
}

impl ScriptAggregationIndexer {
    pub fn new(aggregations: Store<ScriptAggregationModel>, finder: VoutFinder) -> Self {
        Self {
            aggregations,
            finder,
        }
    }

    async fn deltas(&self, block: &RawBlock) -> Result<BTreeMap<String, Delta>, IndexerError> {
        let mut deltas: BTreeMap<String, Delta> = BTreeMap::new();
        for txn in &block.tx {
            for vin in &txn.vin {
                let RawVin::Spend(spend) = vin else {
                    continue;
                };
                let spent = self.finder.find_spent(block, spend).await?;
                let value = spent.value_sats()?;
                let delta = entry(&mut deltas, &spent)?;
                delta.txids.insert(txn.txid.clone());
                delta.tx_out_count += 1;
                delta.tx_out = add_sats(delta.tx_out, value, "txOut")?;
            }
            for vout in &txn.vout {
                if vout.script_pub_key.is_op_return() {
                    continue;
                }
                let created = TransactionVoutModel::new(txn, vout)?;
                let value = created.value_sats()?;
                let delta = entry(&mut deltas, &created)?;
                delta.txids.insert(txn.txid.clone());
                delta.tx_in_count += 1;
                delta.tx_in = add_sats(delta.tx_in, value, "txIn")?;
            }
        }
        Ok(deltas)
    }

    /// The newest row for `hid` strictly below `height`. Reading strictly
    /// below keeps re-indexing the same block from double counting.
    async fn prior(
        &self,
        hid: &str,
        height: u64,
    ) -> Result<Option<ScriptAggregationModel>, IndexerError> {
        let options = QueryOptions::desc(1).lt(keys::encode_height(height)?);
        let page = self.aggregations.query(hid, options).await?;
        Ok(page.items.into_iter().next())
    }
}

fn entry<'a>(
    deltas: &'a mut BTreeMap<String, Delta>,
    vout: &TransactionVoutModel,
) -> Result<&'a mut Delta, IndexerError> {
    let hid = keys::hash_script(&vout.script.hex)?;
    Ok(deltas
        .entry(hid)
        .or_insert_with(|| Delta::new(vout.script.clone())))
}

#[async_trait]
impl Indexer for ScriptAggregationIndexer {
    fn name(&self) -> &str {
        "script_aggregation"
    }

    async fn index(&self, block: &RawBlock) -> Result<(), IndexerError> {
        let context = BlockContext::from(block);
        for (hid, delta) in self.deltas(block).await? {
            let mut row = ScriptAggregationModel::empty(&hid, context.clone(), delta.script)?;
            let (mut tx_in, mut tx_out) = (0, 0);
            if let Some(prior) = self.prior(&hid, block.height).await? {
                (tx_in, tx_out) = prior.amounts_sats()?;
                row.statistic = prior.statistic;
            }
            row.statistic.tx_count += delta.txids.len() as u64;
            row.statistic.tx_in_count += delta.tx_in_count;
            row.statistic.tx_out_count += delta.tx_out_count;
            row.set_amounts(
                add_sats(tx_in, delta.tx_in, "txIn")?,
                add_sats(tx_out, delta.tx_out, "txOut")?,
            )?;
            debug!(
                hid = %hid,
                height = block.height,
                unspent = %row.amount.unspent,
                "aggregated script"
            );
            self.aggregations.put(&row).await?;
        }
        Ok(())
    }

    async fn invalidate(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for hid in self.deltas(block).await?.keys() {
            self.aggregations
                .delete(&ScriptAggregationModel::id_of(block.height, hid)?)
                .await?;
        }
        Ok(())
    }
}

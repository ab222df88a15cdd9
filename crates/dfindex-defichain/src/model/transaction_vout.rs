use dfindex_core::error::IndexerError;
use dfindex_core::keys;
use dfindex_core::store::Entity;
use dfindex_core::types::{coins_to_sats, format_sats, parse_sats, RawTransaction, RawVout};
use serde::{Deserialize, Serialize};

use super::Script;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionVoutModel {
    pub id: String,
    pub txid: String,
    pub n: u32,
    pub value: String,
    pub token_id: Option<u32>,
    pub script: Script,
    pub sort: String,
}

impl TransactionVoutModel {
    pub fn new(txn: &RawTransaction, vout: &RawVout) -> Result<Self, IndexerError> {
        let sort = keys::encode_vout_index(u64::from(vout.n))?;
        Ok(Self {
            id: format!("{}{}", txn.txid, sort),
            txid: txn.txid.clone(),
            n: vout.n,
            value: format_sats(coins_to_sats(vout.value)),
            token_id: vout.token_id,
            script: Script::from(&vout.script_pub_key),
            sort,
        })
    }

    /// Id of the output `n` of `txid`.
    pub fn id_of(txid: &str, n: u32) -> Result<String, IndexerError> {
        Ok(format!("{txid}{}", keys::encode_vout_index(u64::from(n))?))
    }

    /// Stored value in satoshis.
    pub fn value_sats(&self) -> Result<i64, IndexerError> {
        parse_sats(&self.value).ok_or_else(|| {
            IndexerError::Other(format!("vout {} has invalid value '{}'", self.id, self.value))
        })
    }
}

impl Entity for TransactionVoutModel {
    const KIND: &'static str = "transaction_vout";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn partition_key(&self) -> String {
        self.txid.clone()
    }

    fn sort_key(&self) -> String {
        self.sort.clone()
    }
}

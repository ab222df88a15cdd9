use dfindex_core::error::IndexerError;
use dfindex_core::keys;
use dfindex_core::store::Entity;
use dfindex_core::types::{format_sats, BlockContext, RawBlock, RawTransaction};
use serde::{Deserialize, Serialize};

/// A transaction with its position in the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionModel {
    pub id: String,
    pub txid: String,
    /// Index of the transaction within its block.
    pub order: usize,
    pub block: BlockContext,
    pub hash: String,
    pub version: u32,
    pub size: u64,
    pub vsize: u64,
    pub weight: u64,
    pub lock_time: u64,
    pub vin_count: usize,
    pub vout_count: usize,
    pub total_vout_value: String,
    pub sort: String,
}

impl TransactionModel {
    pub fn new(block: &RawBlock, order: usize, txn: &RawTransaction) -> Result<Self, IndexerError> {
        Ok(Self {
            id: txn.txid.clone(),
            txid: txn.txid.clone(),
            order,
            block: BlockContext::from(block),
            hash: txn.hash.clone(),
            version: txn.version,
            size: txn.size,
            vsize: txn.vsize,
            weight: txn.weight,
            lock_time: txn.locktime,
            vin_count: txn.vin.len(),
            vout_count: txn.vout.len(),
            total_vout_value: format_sats(txn.total_vout_sats()),
            sort: keys::encode_vout_index(order as u64)?,
        })
    }
}

impl Entity for TransactionModel {
    const KIND: &'static str = "transaction";

    fn id(&self) -> String {
        self.id.clone()
    }

    /// Transactions are listed per block.
    fn partition_key(&self) -> String {
        self.block.hash.clone()
    }

    fn sort_key(&self) -> String {
        self.sort.clone()
    }
}

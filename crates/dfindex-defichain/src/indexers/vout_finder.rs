//! Resolves the output a vin spends.

use dfindex_core::error::IndexerError;
use dfindex_core::store::Entity;
use dfindex_core::types::{RawBlock, SpendVin};

use crate::database::Store;
use crate::model::TransactionVoutModel;

/// Looks a spent output up in the block being processed first, then in the
/// TransactionVout projection.
///
/// The in-block lookup matters on invalidate: by then this block's vouts are
/// already gone from the store, but spends within the block still resolve.
#[derive(Clone)]
pub struct VoutFinder {
    vouts: Store<TransactionVoutModel>,
}

impl VoutFinder {
    pub fn new(vouts: Store<TransactionVoutModel>) -> Self {
        Self { vouts }
    }

    pub async fn find(
        &self,
        block: &RawBlock,
        txid: &str,
        n: u32,
    ) -> Result<TransactionVoutModel, IndexerError> {
        if let Some(txn) = block.tx.iter().find(|t| t.txid == txid) {
            if let Some(vout) = txn.vout.iter().find(|v| v.n == n) {
                return TransactionVoutModel::new(txn, vout);
            }
        }

        let id = TransactionVoutModel::id_of(txid, n)?;
        match self.vouts.get(&id).await? {
            Some(vout) => Ok(vout),
            None => Err(IndexerError::NotFound {
                kind: TransactionVoutModel::KIND,
                id,
            }),
        }
    }

    /// Shorthand for a spend vin.
    pub async fn find_spent(
        &self,
        block: &RawBlock,
        vin: &SpendVin,
    ) -> Result<TransactionVoutModel, IndexerError> {
        self.find(block, &vin.txid, vin.vout).await
    }
}

//! Transaction, TransactionVin and TransactionVout projections.

use async_trait::async_trait;
use dfindex_core::error::IndexerError;
use dfindex_core::indexer::Indexer;
use dfindex_core::types::{RawBlock, RawVin};

use super::VoutFinder;
use crate::database::Store;
use crate::model::{TransactionModel, TransactionVinModel, TransactionVoutModel};

// ─── Transaction ──────────────────────────────────────────────────────────────

pub struct TransactionIndexer {
    transactions: Store<TransactionModel>,
}

impl TransactionIndexer {
    pub fn new(transactions: Store<TransactionModel>) -> Self {
        Self { transactions }
    }
}

#[async_trait]
impl Indexer for TransactionIndexer {
    fn name(&self) -> &str {
        "transaction"
    }

    async fn index(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for (order, txn) in block.tx.iter().enumerate() {
            self.transactions
                .put(&TransactionModel::new(block, order, txn)?)
                .await?;
        }
        Ok(())
    }

    async fn invalidate(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for txn in &block.tx {
            self.transactions.delete(&txn.txid).await?;
        }
        Ok(())
    }
}

// ─── TransactionVin ───────────────────────────────────────────────────────────

pub struct TransactionVinIndexer {
    vins: Store<TransactionVinModel>,
    finder: VoutFinder,
}

impl TransactionVinIndexer {
    pub fn new(vins: Store<TransactionVinModel>, finder: VoutFinder) -> Self {
        Self { vins, finder }
    }
}

#[async_trait]
impl Indexer for TransactionVinIndexer {
    fn name(&self) -> &str {
        "transaction_vin"
    }

    async fn index(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for txn in &block.tx {
            for vin in &txn.vin {
                let spent = match vin {
                    RawVin::Coinbase(_) => None,
                    RawVin::Spend(spend) => Some(self.finder.find_spent(block, spend).await?),
                };
                let model = TransactionVinModel::new(txn, vin, spent.as_ref())?;
                self.vins.put(&model).await?;
            }
        }
        Ok(())
    }

    async fn invalidate(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for txn in &block.tx {
            for vin in &txn.vin {
                self.vins
                    .delete(&TransactionVinModel::id_of(&txn.txid, vin)?)
                    .await?;
            }
        }
        Ok(())
    }
}

// ─── TransactionVout ──────────────────────────────────────────────────────────

pub struct TransactionVoutIndexer {
    vouts: Store<TransactionVoutModel>,
}

impl TransactionVoutIndexer {
    pub fn new(vouts: Store<TransactionVoutModel>) -> Self {
        Self { vouts }
    }
}

#[async_trait]
impl Indexer for TransactionVoutIndexer {
    fn name(&self) -> &str {
        "transaction_vout"
    }

    async fn index(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for txn in &block.tx {
            for vout in &txn.vout {
                self.vouts
                    .put(&TransactionVoutModel::new(txn, vout)?)
                    .await?;
            }
        }
        Ok(())
    }

    async fn invalidate(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for txn in &block.tx {
            for vout in &txn.vout {
                self.vouts
                    .delete(&TransactionVoutModel::id_of(&txn.txid, vout.n)?)
                    .await?;
            }
        }
        Ok(())
    }
}

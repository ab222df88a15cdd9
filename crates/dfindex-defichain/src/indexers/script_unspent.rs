//! Per-script unspent outputs.

use std::collections::HashSet;

use async_trait::async_trait;
use dfindex_core::error::IndexerError;
use dfindex_core::indexer::Indexer;
use dfindex_core::keys;
use dfindex_core::store::Entity;
use dfindex_core::types::{BlockContext, RawBlock, RawVin};

use super::VoutFinder;
use crate::database::Store;
use crate::model::{ScriptUnspentModel, TransactionModel, TransactionVoutModel};

pub struct ScriptUnspentIndexer {
    unspents: Store<ScriptUnspentModel>,
    transactions: Store<TransactionModel>,
    finder: VoutFinder,
}

impl ScriptUnspentIndexer {
    pub fn new(
        unspents: Store<ScriptUnspentModel>,
        transactions: Store<TransactionModel>,
        finder: VoutFinder,
    ) -> Self {
        Self {
            unspents,
            transactions,
            finder,
        }
    }

    /// Re-create the unspent row for an output created in an earlier block.
    async fn restore(&self, block: &RawBlock, txid: &str, n: u32) -> Result<(), IndexerError> {
        let vout = self.finder.find(block, txid, n).await?;
        let created_in = match self.transactions.get(txid).await? {
            Some(txn) => txn.block,
            None => {
                return Err(IndexerError::NotFound {
                    kind: TransactionModel::KIND,
                    id: txid.to_string(),
                })
            }
        };
        let hid = keys::hash_script(&vout.script.hex)?;
        self.unspents
            .put(&ScriptUnspentModel::new(&hid, created_in, &vout)?)
            .await
    }
}

#[async_trait]
impl Indexer for ScriptUnspentIndexer {
    fn name(&self) -> &str {
        "script_unspent"
    }

    async fn index(&self, block: &RawBlock) -> Result<(), IndexerError> {
        let context = BlockContext::from(block);
        for txn in &block.tx {
            for vin in &txn.vin {
                if let RawVin::Spend(spend) = vin {
                    self.unspents
                        .delete(&TransactionVoutModel::id_of(&spend.txid, spend.vout)?)
                        .await?;
                }
            }
            for vout in &txn.vout {
                if vout.script_pub_key.is_op_return() {
                    continue;
                }
                let model = TransactionVoutModel::new(txn, vout)?;
                let hid = keys::hash_script(&model.script.hex)?;
                self.unspents
                    .put(&ScriptUnspentModel::new(&hid, context.clone(), &model)?)
                    .await?;
            }
        }
        Ok(())
    }

    async fn invalidate(&self, block: &RawBlock) -> Result<(), IndexerError> {
        let in_block: HashSet<&str> = block.tx.iter().map(|t| t.txid.as_str()).collect();
        for txn in &block.tx {
            for vout in &txn.vout {
                self.unspents
                    .delete(&TransactionVoutModel::id_of(&txn.txid, vout.n)?)
                    .await?;
            }
            for vin in &txn.vin {
                let RawVin::Spend(spend) = vin else {
                    continue;
                };
                // outputs created and spent within this block vanish with it
                if in_block.contains(spend.txid.as_str()) {
                    continue;
                }
                self.restore(block, &spend.txid, spend.vout).await?;
            }
        }
        Ok(())
    }
}

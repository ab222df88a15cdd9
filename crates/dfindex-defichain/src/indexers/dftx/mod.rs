//! DfTx fan-out: extract every DfTx in a block and hand each one to the
//! indexers registered for its op-code.

mod auction_bid;
mod dex_swap;
mod token;

pub use auction_bid::AuctionBidIndexer;
pub use dex_swap::DexSwapIndexer;
pub use token::TokenIndexer;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dfindex_core::error::IndexerError;
use dfindex_core::indexer::Indexer;
use dfindex_core::types::RawBlock;
use tracing::debug;

use crate::dftx::{self, DfTxPayload, DfTxTransaction};

/// Indexer for one or more DfTx op-codes.
#[async_trait]
pub trait DfTxIndexer: Send + Sync {
    fn name(&self) -> &str;

    /// Op-codes this indexer is dispatched for.
    fn op_codes(&self) -> &'static [u8];

    async fn index(&self, block: &RawBlock, txn: &DfTxTransaction<'_>) -> Result<(), IndexerError>;

    async fn invalidate(
        &self,
        block: &RawBlock,
        txn: &DfTxTransaction<'_>,
    ) -> Result<(), IndexerError>;

    /// Called once with the genesis block, before any DfTx in it.
    async fn index_genesis(&self, _block: &RawBlock) -> Result<(), IndexerError> {
        Ok(())
    }

    async fn invalidate_genesis(&self, _block: &RawBlock) -> Result<(), IndexerError> {
        Ok(())
    }
}

/// Routes each extracted DfTx to its indexers, in block order.
pub struct RootDfTxIndexer {
    indexers: Vec<Arc<dyn DfTxIndexer>>,
    dispatch: HashMap<u8, Vec<Arc<dyn DfTxIndexer>>>,
}

impl RootDfTxIndexer {
    pub fn new(indexers: Vec<Arc<dyn DfTxIndexer>>) -> Self {
        let mut dispatch: HashMap<u8, Vec<Arc<dyn DfTxIndexer>>> = HashMap::new();
        for indexer in &indexers {
            for op_code in indexer.op_codes() {
                dispatch.entry(*op_code).or_default().push(Arc::clone(indexer));
            }
        }
        Self { indexers, dispatch }
    }

    fn targets(&self, txn: &DfTxTransaction<'_>) -> &[Arc<dyn DfTxIndexer>] {
        if matches!(txn.dftx, DfTxPayload::Unmapped { .. }) {
            return &[];
        }
        self.dispatch
            .get(&txn.dftx.op_code())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[async_trait]
impl Indexer for RootDfTxIndexer {
    fn name(&self) -> &str {
        "dftx"
    }

    async fn index(&self, block: &RawBlock) -> Result<(), IndexerError> {
        if block.height == 0 {
            for indexer in &self.indexers {
                indexer.index_genesis(block).await?;
            }
        }
        for txn in dftx::extract(block) {
            for indexer in self.targets(&txn) {
                debug!(
                    indexer = indexer.name(),
                    txid = %txn.txn.txid,
                    op_code = %char::from(txn.dftx.op_code()),
                    "indexing DfTx"
                );
                indexer.index(block, &txn).await?;
            }
        }
        Ok(())
    }

    async fn invalidate(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for txn in dftx::extract(block) {
            for indexer in self.targets(&txn) {
                indexer.invalidate(block, &txn).await?;
            }
        }
        if block.height == 0 {
            for indexer in &self.indexers {
                indexer.invalidate_genesis(block).await?;
            }
        }
        Ok(())
    }
}

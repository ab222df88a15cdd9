//! The ordered set of indexers a block is fanned out to.

use std::sync::Arc;

use async_trait::async_trait;
use dfindex_core::error::IndexerError;
use dfindex_core::indexer::Indexer;
use dfindex_core::types::RawBlock;
use tracing::{debug, error, warn};

use crate::database::Database;
use crate::indexers::dftx::{AuctionBidIndexer, DexSwapIndexer, TokenIndexer};
use crate::indexers::{
    BlockIndexer, DfTxIndexer, RootDfTxIndexer, ScriptActivityIndexer, ScriptAggregationIndexer,
    ScriptUnspentIndexer, TransactionIndexer, TransactionVinIndexer, TransactionVoutIndexer,
    VoutFinder,
};

/// Runs every registered indexer in registration order, for both `index`
/// and `invalidate`. The first failure aborts the block.
///
/// A failed `index` is rolled back: the indexers that already ran (and the
/// one that failed) are invalidated in reverse order, so the Block row never
/// outlives a partially indexed block and the cursor stays put.
pub struct RootIndexer {
    indexers: Vec<Arc<dyn Indexer>>,
}

impl RootIndexer {
    /// The standard pipeline over `db`.
    pub fn new(db: &Database) -> Self {
        let finder = VoutFinder::new(db.transaction_vouts.clone());
        let dftx: Vec<Arc<dyn DfTxIndexer>> = vec![
            Arc::new(TokenIndexer::new(db.tokens.clone())),
            Arc::new(DexSwapIndexer::new(db.dex_swaps.clone())),
            Arc::new(AuctionBidIndexer::new(db.auction_bids.clone())),
        ];
        Self::with_indexers(vec![
            Arc::new(BlockIndexer::new(db.blocks.clone())),
            Arc::new(RootDfTxIndexer::new(dftx)),
            Arc::new(TransactionIndexer::new(db.transactions.clone())),
            Arc::new(TransactionVinIndexer::new(
                db.transaction_vins.clone(),
                finder.clone(),
            )),
            Arc::new(TransactionVoutIndexer::new(db.transaction_vouts.clone())),
            Arc::new(ScriptActivityIndexer::new(
                db.script_activities.clone(),
                finder.clone(),
            )),
            Arc::new(ScriptAggregationIndexer::new(
                db.script_aggregations.clone(),
                finder.clone(),
            )),
            Arc::new(ScriptUnspentIndexer::new(
                db.script_unspents.clone(),
                db.transactions.clone(),
                finder,
            )),
        ])
    }

    pub fn with_indexers(indexers: Vec<Arc<dyn Indexer>>) -> Self {
        Self { indexers }
    }

    /// Best-effort invalidation of `indexers[..=failed]`, newest first.
    async fn rollback(&self, block: &RawBlock, failed: usize) {
        for indexer in self.indexers[..=failed].iter().rev() {
            if let Err(e) = indexer.invalidate(block).await {
                warn!(
                    indexer = indexer.name(),
                    height = block.height,
                    error = %e,
                    "rollback failed"
                );
            }
        }
    }

    /// Registered indexer names, in run order.
    pub fn names(&self) -> Vec<&str> {
        self.indexers.iter().map(|i| i.name()).collect()
    }
}

#[async_trait]
impl Indexer for RootIndexer {
    fn name(&self) -> &str {
        "root"
    }

    async fn index(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for (i, indexer) in self.indexers.iter().enumerate() {
            debug!(indexer = indexer.name(), height = block.height, "index");
            if let Err(e) = indexer.index(block).await {
                error!(
                    indexer = indexer.name(),
                    height = block.height,
                    hash = %block.hash,
                    error = %e,
                    "indexer failed"
                );
                self.rollback(block, i).await;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn invalidate(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for indexer in &self.indexers {
            debug!(indexer = indexer.name(), height = block.height, "invalidate");
            if let Err(e) = indexer.invalidate(block).await {
                error!(
                    indexer = indexer.name(),
                    height = block.height,
                    hash = %block.hash,
                    error = %e,
                    "invalidation failed"
                );
                return Err(e);
            }
        }
        Ok(())
    }
}

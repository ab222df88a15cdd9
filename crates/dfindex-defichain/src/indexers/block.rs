use async_trait::async_trait;
use dfindex_core::error::IndexerError;
use dfindex_core::indexer::Indexer;
use dfindex_core::types::RawBlock;

use crate::database::Store;
use crate::model::BlockModel;

pub struct BlockIndexer {
    blocks: Store<BlockModel>,
}

impl BlockIndexer {
    pub fn new(blocks: Store<BlockModel>) -> Self {
        Self { blocks }
    }
}

#[async_trait]
impl Indexer for BlockIndexer {
    fn name(&self) -> &str {
        "block"
    }

    async fn index(&self, block: &RawBlock) -> Result<(), IndexerError> {
        self.blocks.put(&BlockModel::from_raw(block)?).await
    }

    async fn invalidate(&self, block: &RawBlock) -> Result<(), IndexerError> {
        self.blocks.delete(&block.hash).await
    }
}

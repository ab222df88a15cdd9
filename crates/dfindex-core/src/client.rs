//! The `ChainClient` trait: the pipeline's only view of chain state.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::types::RawBlock;

/// Read access to a full node.
///
/// Implementations must report a missing height as
/// [`ClientError::HeightOutOfRange`] so the sync loop can tell "caught up"
/// apart from a failure.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Height of the node's best chain tip.
    async fn get_block_count(&self) -> Result<u64, ClientError>;

    /// Hash of the best-chain block at `height`.
    async fn get_block_hash(&self, height: u64) -> Result<String, ClientError>;

    /// Full block (verbosity 2: transactions decoded inline).
    async fn get_block(&self, hash: &str) -> Result<RawBlock, ClientError>;
}

#[async_trait]
impl<C: ChainClient + ?Sized> ChainClient for std::sync::Arc<C> {
    async fn get_block_count(&self) -> Result<u64, ClientError> {
        (**self).get_block_count().await
    }

    async fn get_block_hash(&self, height: u64) -> Result<String, ClientError> {
        (**self).get_block_hash(height).await
    }

    async fn get_block(&self, hash: &str) -> Result<RawBlock, ClientError> {
        (**self).get_block(hash).await
    }
}

use async_trait::async_trait;
use dfindex_core::error::IndexerError;
use dfindex_core::types::{BlockContext, RawBlock};

use super::DfTxIndexer;
use crate::database::Store;
use crate::dftx::{op, DfTxPayload, DfTxTransaction};
use crate::model::TokenModel;

/// Token definitions from `CreateToken`, plus the native token at genesis.
pub struct TokenIndexer {
    tokens: Store<TokenModel>,
}

impl TokenIndexer {
    pub fn new(tokens: Store<TokenModel>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl DfTxIndexer for TokenIndexer {
    fn name(&self) -> &str {
        "token"
    }

    fn op_codes(&self) -> &'static [u8] {
        &[op::CREATE_TOKEN]
    }

    async fn index(&self, block: &RawBlock, txn: &DfTxTransaction<'_>) -> Result<(), IndexerError> {
        if let DfTxPayload::CreateToken(token) = &txn.dftx {
            let model = TokenModel::created(&txn.txn.txid, txn.txno, block.into(), token)?;
            self.tokens.put(&model).await?;
        }
        Ok(())
    }

    async fn invalidate(
        &self,
        _block: &RawBlock,
        txn: &DfTxTransaction<'_>,
    ) -> Result<(), IndexerError> {
        self.tokens.delete(&txn.txn.txid).await
    }

    async fn index_genesis(&self, block: &RawBlock) -> Result<(), IndexerError> {
        self.tokens
            .put(&TokenModel::native(BlockContext::from(block))?)
            .await
    }

    async fn invalidate_genesis(&self, _block: &RawBlock) -> Result<(), IndexerError> {
        self.tokens.delete(TokenModel::NATIVE_ID).await
    }
}

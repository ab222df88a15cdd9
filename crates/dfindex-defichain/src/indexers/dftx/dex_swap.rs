use async_trait::async_trait;
use dfindex_core::error::IndexerError;
use dfindex_core::types::RawBlock;

use super::DfTxIndexer;
use crate::database::Store;
use crate::dftx::{op, DfTxPayload, DfTxTransaction};
use crate::model::DexSwapModel;

/// Pool swaps, direct and composite, listed per token pair.
pub struct DexSwapIndexer {
    swaps: Store<DexSwapModel>,
}

impl DexSwapIndexer {
    pub fn new(swaps: Store<DexSwapModel>) -> Self {
        Self { swaps }
    }
}

#[async_trait]
impl DfTxIndexer for DexSwapIndexer {
    fn name(&self) -> &str {
        "dex_swap"
    }

    fn op_codes(&self) -> &'static [u8] {
        &[op::POOL_SWAP, op::COMPOSITE_SWAP]
    }

    async fn index(&self, block: &RawBlock, txn: &DfTxTransaction<'_>) -> Result<(), IndexerError> {
        let (swap, pools) = match &txn.dftx {
            DfTxPayload::PoolSwap(swap) => (swap, &[][..]),
            DfTxPayload::CompositeSwap(c) => (&c.pool_swap, c.pools.as_slice()),
            _ => return Ok(()),
        };
        let model = DexSwapModel::new(&txn.txn.txid, txn.txno, block.into(), swap, pools)?;
        self.swaps.put(&model).await
    }

    async fn invalidate(
        &self,
        _block: &RawBlock,
        txn: &DfTxTransaction<'_>,
    ) -> Result<(), IndexerError> {
        self.swaps.delete(&txn.txn.txid).await
    }
}

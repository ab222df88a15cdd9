use async_trait::async_trait;
use dfindex_core::error::IndexerError;
use dfindex_core::types::RawBlock;

use super::DfTxIndexer;
use crate::database::Store;
use crate::dftx::{op, DfTxPayload, DfTxTransaction};
use crate::model::AuctionBidModel;

/// Vault auction bid history.
pub struct AuctionBidIndexer {
    bids: Store<AuctionBidModel>,
}

impl AuctionBidIndexer {
    pub fn new(bids: Store<AuctionBidModel>) -> Self {
        Self { bids }
    }
}

#[async_trait]
impl DfTxIndexer for AuctionBidIndexer {
    fn name(&self) -> &str {
        "auction_bid"
    }

    fn op_codes(&self) -> &'static [u8] {
        &[op::AUCTION_BID]
    }

    async fn index(&self, block: &RawBlock, txn: &DfTxTransaction<'_>) -> Result<(), IndexerError> {
        if let DfTxPayload::AuctionBid(bid) = &txn.dftx {
            let model = AuctionBidModel::new(&txn.txn.txid, txn.txno, block.into(), bid)?;
            self.bids.put(&model).await?;
        }
        Ok(())
    }

    async fn invalidate(
        &self,
        _block: &RawBlock,
        txn: &DfTxTransaction<'_>,
    ) -> Result<(), IndexerError> {
        if let DfTxPayload::AuctionBid(bid) = &txn.dftx {
            let key = AuctionBidModel::key_of(&bid.vault_id, bid.index);
            self.bids.delete(&format!("{key}-{}", txn.txn.txid)).await?;
        }
        Ok(())
    }
}

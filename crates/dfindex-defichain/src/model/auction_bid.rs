use dfindex_core::error::IndexerError;
use dfindex_core::keys;
use dfindex_core::store::Entity;
use dfindex_core::types::{format_sats, BlockContext};
use serde::{Deserialize, Serialize};

use crate::dftx::AuctionBid;

/// A bid placed on one batch of a vault auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionBidModel {
    pub id: String,
    /// `"{vaultId}-{index}"`, the auction batch this bid targets.
    pub key: String,
    pub vault_id: String,
    pub index: u32,
    pub txid: String,
    pub txno: usize,
    pub from: String,
    pub token_id: u64,
    pub amount: String,
    pub block: BlockContext,
    pub sort: String,
}

impl AuctionBidModel {
    pub fn new(
        txid: &str,
        txno: usize,
        block: BlockContext,
        bid: &AuctionBid,
    ) -> Result<Self, IndexerError> {
        let key = Self::key_of(&bid.vault_id, bid.index);
        Ok(Self {
            id: format!("{key}-{txid}"),
            key,
            vault_id: bid.vault_id.clone(),
            index: bid.index,
            txid: txid.to_string(),
            txno,
            from: bid.from.clone(),
            token_id: bid.token_id,
            amount: format_sats(bid.amount),
            sort: format!(
                "{}{}",
                keys::encode_height(block.height)?,
                keys::encode_vout_index(txno as u64)?
            ),
            block,
        })
    }

    pub fn key_of(vault_id: &str, index: u32) -> String {
        format!("{vault_id}-{index}")
    }
}

impl Entity for AuctionBidModel {
    const KIND: &'static str = "auction_bid";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn partition_key(&self) -> String {
        self.key.clone()
    }

    fn sort_key(&self) -> String {
        self.sort.clone()
    }
}

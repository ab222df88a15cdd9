use dfindex_core::error::IndexerError;
use dfindex_core::keys;
use dfindex_core::store::Entity;
use dfindex_core::types::{format_sats, BlockContext};
use serde::{Deserialize, Serialize};

use crate::dftx::{MaxPrice, PoolSwap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DexSwapKind {
    /// Single pool.
    Direct,
    /// Routed through several pools.
    Composite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapFrom {
    pub script: String,
    pub token_id: u64,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTo {
    pub script: String,
    pub token_id: u64,
}

/// A pool swap request, listed per token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexSwapModel {
    pub id: String,
    pub txid: String,
    pub txno: usize,
    pub kind: DexSwapKind,
    /// `"{fromTokenId}-{toTokenId}"`
    pub pair: String,
    pub from: SwapFrom,
    pub to: SwapTo,
    pub max_price: MaxPrice,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pools: Vec<u64>,
    pub block: BlockContext,
    pub sort: String,
}

impl DexSwapModel {
    pub fn new(
        txid: &str,
        txno: usize,
        block: BlockContext,
        swap: &PoolSwap,
        pools: &[u64],
    ) -> Result<Self, IndexerError> {
        let kind = if pools.is_empty() {
            DexSwapKind::Direct
        } else {
            DexSwapKind::Composite
        };
        Ok(Self {
            id: txid.to_string(),
            txid: txid.to_string(),
            txno,
            kind,
            pair: Self::pair_of(swap.from_token_id, swap.to_token_id),
            from: SwapFrom {
                script: swap.from_script.clone(),
                token_id: swap.from_token_id,
                amount: format_sats(swap.from_amount),
            },
            to: SwapTo {
                script: swap.to_script.clone(),
                token_id: swap.to_token_id,
            },
            max_price: swap.max_price,
            pools: pools.to_vec(),
            sort: format!(
                "{}{}",
                keys::encode_height(block.height)?,
                keys::encode_vout_index(txno as u64)?
            ),
            block,
        })
    }

    pub fn pair_of(from: u64, to: u64) -> String {
        format!("{from}-{to}")
    }
}

impl Entity for DexSwapModel {
    const KIND: &'static str = "dex_swap";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn partition_key(&self) -> String {
        self.pair.clone()
    }

    fn sort_key(&self) -> String {
        self.sort.clone()
    }
}

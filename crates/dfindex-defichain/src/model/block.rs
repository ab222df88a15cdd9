use dfindex_core::error::IndexerError;
use dfindex_core::keys;
use dfindex_core::store::Entity;
use dfindex_core::types::{format_sats, RawBlock};
use dfindex_core::Cursor;
use serde::{Deserialize, Serialize};

/// An indexed block.
///
/// Carries the full raw block it was built from, so invalidating it later
/// never needs the node to still serve a block that left the best chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockModel {
    pub id: String,
    pub hash: String,
    pub previous_hash: Option<String>,
    pub height: u64,
    pub version: i64,
    pub time: i64,
    pub median_time: i64,
    pub transaction_count: usize,
    pub difficulty: f64,
    pub masternode: Option<String>,
    pub minter: Option<String>,
    pub minter_block_count: Option<u64>,
    pub stake_modifier: Option<String>,
    pub merkleroot: String,
    pub size: u64,
    pub size_stripped: u64,
    pub weight: u64,
    pub reward: String,
    pub sort: String,
    pub raw: RawBlock,
}

impl BlockModel {
    pub fn from_raw(block: &RawBlock) -> Result<Self, IndexerError> {
        Ok(Self {
            id: block.hash.clone(),
            hash: block.hash.clone(),
            previous_hash: block.previous_hash.clone(),
            height: block.height,
            version: block.version,
            time: block.time,
            median_time: block.median_time,
            transaction_count: block.tx.len(),
            difficulty: block.difficulty,
            masternode: block.masternode.clone(),
            minter: block.minter.clone(),
            minter_block_count: block.minted_blocks,
            stake_modifier: block.stake_modifier.clone(),
            merkleroot: block.merkleroot.clone(),
            size: block.size,
            size_stripped: block.stripped_size,
            weight: block.weight,
            reward: format_sats(block.reward()),
            sort: keys::encode_height(block.height)?,
            raw: block.clone(),
        })
    }

    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.height, self.hash.clone())
    }
}

impl Entity for BlockModel {
    const KIND: &'static str = "block";

    fn id(&self) -> String {
        self.id.clone()
    }

    /// All blocks share one partition so "highest block" is a single scan.
    fn partition_key(&self) -> String {
        String::new()
    }

    fn sort_key(&self) -> String {
        self.sort.clone()
    }
}

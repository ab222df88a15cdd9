//! In-memory chain for tests and demos.
//!
//! [`MockChainClient`] serves a mutable best chain plus every block it has
//! ever served, the way a node keeps stale blocks after a reorg.
//! [`BlockBuilder`] produces linked blocks with deterministic hashes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use dfindex_core::client::ChainClient;
use dfindex_core::error::ClientError;
use dfindex_core::types::{
    CoinbaseVin, RawBlock, RawTransaction, RawVin, RawVout, ScriptPubKey, ScriptSig, SpendVin,
};
use sha2::{Digest, Sha256};

#[derive(Default)]
struct Chain {
    best: Vec<RawBlock>,
    known: HashMap<String, RawBlock>,
}

#[derive(Default)]
pub struct MockChainClient {
    chain: Mutex<Chain>,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blocks(blocks: impl IntoIterator<Item = RawBlock>) -> Self {
        let client = Self::new();
        for block in blocks {
            client.push(block);
        }
        client
    }

    fn lock(&self) -> Result<MutexGuard<'_, Chain>, ClientError> {
        self.chain
            .lock()
            .map_err(|_| ClientError::Transport("mock chain lock poisoned".into()))
    }

    /// Append to the best chain.
    pub fn push(&self, block: RawBlock) {
        if let Ok(mut chain) = self.chain.lock() {
            chain.known.insert(block.hash.clone(), block.clone());
            chain.best.push(block);
        }
    }

    /// Replace the best chain from `blocks[0].height` upward.
    pub fn reorg_to(&self, blocks: impl IntoIterator<Item = RawBlock>) {
        let mut blocks = blocks.into_iter().peekable();
        let Some(fork) = blocks.peek().map(|b| b.height) else {
            return;
        };
        if let Ok(mut chain) = self.chain.lock() {
            chain.best.truncate(fork as usize);
        }
        for block in blocks {
            self.push(block);
        }
    }

    pub fn tip(&self) -> Option<RawBlock> {
        self.chain.lock().ok()?.best.last().cloned()
    }

    pub fn block_at(&self, height: u64) -> Option<RawBlock> {
        self.chain.lock().ok()?.best.get(height as usize).cloned()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_block_count(&self) -> Result<u64, ClientError> {
        let chain = self.lock()?;
        Ok(chain.best.len().saturating_sub(1) as u64)
    }

    async fn get_block_hash(&self, height: u64) -> Result<String, ClientError> {
        let chain = self.lock()?;
        chain
            .best
            .get(height as usize)
            .map(|b| b.hash.clone())
            .ok_or(ClientError::HeightOutOfRange { height })
    }

    async fn get_block(&self, hash: &str) -> Result<RawBlock, ClientError> {
        let chain = self.lock()?;
        chain
            .known
            .get(hash)
            .cloned()
            .ok_or_else(|| ClientError::BlockNotFound {
                hash: hash.to_string(),
            })
    }
}

// ─── BlockBuilder ─────────────────────────────────────────────────────────────

fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Builds a block on top of a parent. Transaction ids derive from the height,
/// the branch label and the position, so two branches never collide.
pub struct BlockBuilder {
    height: u64,
    previous_hash: Option<String>,
    branch: String,
    time: i64,
    tx: Vec<RawTransaction>,
}

impl BlockBuilder {
    pub fn genesis() -> Self {
        Self {
            height: 0,
            previous_hash: None,
            branch: String::new(),
            time: 1_587_883_831,
            tx: Vec::new(),
        }
    }

    pub fn child_of(parent: &RawBlock) -> Self {
        Self {
            height: parent.height + 1,
            previous_hash: Some(parent.hash.clone()),
            branch: String::new(),
            time: parent.time + 30,
            tx: Vec::new(),
        }
    }

    /// Label distinguishing competing blocks at the same height.
    pub fn branch(mut self, label: impl Into<String>) -> Self {
        self.branch = label.into();
        self
    }

    fn next_txid(&self) -> String {
        digest(&[
            "tx",
            &self.height.to_string(),
            &self.branch,
            &self.tx.len().to_string(),
        ])
    }

    /// Add the coinbase paying `(script hex, value in coins)` outputs.
    pub fn coinbase(mut self, outputs: &[(&str, f64)]) -> Self {
        let txid = self.next_txid();
        let vin = RawVin::Coinbase(CoinbaseVin {
            coinbase: format!("{:02x}", self.height & 0xff),
            sequence: u64::from(u32::MAX),
            txinwitness: vec![],
        });
        self.tx.push(transaction(txid, vec![vin], outputs));
        self
    }

    /// Add a transaction spending `(txid, n)` outpoints.
    pub fn transaction(mut self, spends: &[(&str, u32)], outputs: &[(&str, f64)]) -> Self {
        let txid = self.next_txid();
        let vin = spends
            .iter()
            .map(|(txid, n)| {
                RawVin::Spend(SpendVin {
                    txid: txid.to_string(),
                    vout: *n,
                    script_sig: ScriptSig::default(),
                    sequence: u64::from(u32::MAX),
                    txinwitness: vec![],
                })
            })
            .collect();
        self.tx.push(transaction(txid, vin, outputs));
        self
    }

    pub fn build(self) -> RawBlock {
        let txids: Vec<&str> = self.tx.iter().map(|t| t.txid.as_str()).collect();
        let hash = digest(&[
            "block",
            &self.height.to_string(),
            self.previous_hash.as_deref().unwrap_or(""),
            &self.branch,
            &txids.concat(),
        ]);
        RawBlock {
            hash,
            height: self.height,
            previous_hash: self.previous_hash,
            time: self.time,
            median_time: self.time,
            version: 536_870_912,
            merkleroot: digest(&txids),
            size: 0,
            stripped_size: 0,
            weight: 0,
            difficulty: 1.0,
            masternode: None,
            minter: None,
            minted_blocks: None,
            stake_modifier: None,
            tx: self.tx,
        }
    }
}

fn transaction(txid: String, vin: Vec<RawVin>, outputs: &[(&str, f64)]) -> RawTransaction {
    let vout = outputs
        .iter()
        .enumerate()
        .map(|(n, (script, value))| RawVout {
            value: *value,
            n: n as u32,
            script_pub_key: ScriptPubKey {
                hex: script.to_string(),
                kind: if script.starts_with("6a") {
                    "nulldata".into()
                } else {
                    "witness_v0_keyhash".into()
                },
                ..Default::default()
            },
            token_id: Some(0),
        })
        .collect();
    RawTransaction {
        hash: txid.clone(),
        txid,
        version: 4,
        size: 0,
        vsize: 0,
        weight: 0,
        locktime: 0,
        vin,
        vout,
        hex: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_best_chain_and_stale_blocks() {
        let genesis = BlockBuilder::genesis().coinbase(&[("51", 1.0)]).build();
        let a1 = BlockBuilder::child_of(&genesis).branch("a").build();
        let client = MockChainClient::with_blocks([genesis.clone(), a1.clone()]);
        assert_eq!(client.get_block_count().await.unwrap(), 1);

        let b1 = BlockBuilder::child_of(&genesis).branch("b").build();
        assert_ne!(a1.hash, b1.hash);
        client.reorg_to([b1.clone()]);

        assert_eq!(client.get_block_hash(1).await.unwrap(), b1.hash);
        assert!(client.get_block_hash(2).await.unwrap_err().is_out_of_range());
        // the node still serves the orphan by hash
        assert_eq!(client.get_block(&a1.hash).await.unwrap(), a1);
    }
}

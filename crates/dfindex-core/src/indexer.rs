//! Entity indexer contract, configuration and sync-loop state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IndexerError;
use crate::types::RawBlock;

/// One projection's reaction to a block entering or leaving the best chain.
///
/// Both operations must be idempotent: running `index` twice for the same
/// block leaves the same end state as running it once, and `invalidate`
/// undoes exactly what `index` did using only data carried on `block`.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    async fn index(&self, block: &RawBlock) -> Result<(), IndexerError>;

    async fn invalidate(&self, block: &RawBlock) -> Result<(), IndexerError>;
}

/// Configuration for an indexer instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Node JSON-RPC endpoint.
    pub rpc_url: String,
    pub rpc_user: Option<String>,
    pub rpc_password: Option<String>,
    /// Per-request timeout for node calls (milliseconds).
    pub rpc_timeout_ms: u64,
    /// Retries for transport failures before a call is reported failed.
    pub rpc_max_retries: u32,
    /// SQLite database path; `None` keeps projections in memory.
    pub database: Option<String>,
    /// How often the sync loop ticks (milliseconds).
    pub poll_interval_ms: u64,
    /// How long `stop()` waits for an in-flight cycle (milliseconds).
    pub stop_timeout_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8554".into(),
            rpc_user: None,
            rpc_password: None,
            rpc_timeout_ms: 30_000,
            rpc_max_retries: 3,
            database: None,
            poll_interval_ms: 1000,
            stop_timeout_ms: 30_000,
        }
    }
}

/// Runtime state of the sync loop.
///
/// `Stopped → Idle` on start; a tick moves `Idle → Cycling → Idle`; a stop
/// request moves `Idle → Stopped` directly or `Cycling → Stopping → Stopped`
/// once the in-flight cycle returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    /// Not running; ticks are ignored.
    Stopped,
    /// Running, nothing in flight.
    Idle,
    /// A cycle is advancing the projections.
    Cycling,
    /// A cycle is in flight and will not start another iteration.
    Stopping,
}

impl SyncState {
    /// Returns `true` if no indexer call can be in flight.
    pub fn is_quiescent(&self) -> bool {
        matches!(self, Self::Stopped | Self::Idle)
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Idle => write!(f, "idle"),
            Self::Cycling => write!(f, "cycling"),
            Self::Stopping => write!(f, "stopping"),
        }
    }
}

//! Fluent builder for [`IndexerConfig`] and the [`BlockProvider`] it describes.
//!
//! # Example
//!
//! ```rust
//! use dfindex_defichain::IndexerBuilder;
//!
//! let config = IndexerBuilder::new()
//!     .rpc_url("http://127.0.0.1:8554")
//!     .rpc_auth("rpcuser", "rpcpassword")
//!     .database("dfindex.db")
//!     .poll_interval_ms(500)
//!     .build_config();
//! assert_eq!(config.poll_interval_ms, 500);
//! ```

use dfindex_core::error::IndexerError;
use dfindex_core::indexer::IndexerConfig;

use crate::database::Database;
use crate::provider::BlockProvider;
use crate::rpc::HttpChainClient;

#[derive(Debug, Clone, Default)]
pub struct IndexerBuilder {
    config: IndexerConfig,
}

impl IndexerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. one loaded from a file.
    pub fn from_config(config: IndexerConfig) -> Self {
        Self { config }
    }

    /// Node JSON-RPC endpoint.
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.config.rpc_url = url.into();
        self
    }

    /// Basic-auth credentials for the node.
    pub fn rpc_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.rpc_user = Some(user.into());
        self.config.rpc_password = Some(password.into());
        self
    }

    pub fn rpc_timeout_ms(mut self, ms: u64) -> Self {
        self.config.rpc_timeout_ms = ms;
        self
    }

    pub fn rpc_max_retries(mut self, retries: u32) -> Self {
        self.config.rpc_max_retries = retries;
        self
    }

    /// Persist projections to a SQLite file instead of memory.
    pub fn database(mut self, path: impl Into<String>) -> Self {
        self.config.database = Some(path.into());
        self
    }

    /// Sync loop tick interval in milliseconds.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn stop_timeout_ms(mut self, ms: u64) -> Self {
        self.config.stop_timeout_ms = ms;
        self
    }

    pub fn build_config(self) -> IndexerConfig {
        self.config
    }

    /// Open the configured storage: memory when no path is set.
    pub async fn open_database(&self) -> Result<Database, IndexerError> {
        match &self.config.database {
            None => Ok(Database::in_memory()),
            #[cfg(feature = "sqlite")]
            Some(path) => Database::sqlite(path).await,
            #[cfg(not(feature = "sqlite"))]
            Some(path) => Err(IndexerError::Storage(format!(
                "database {path} requested but built without the `sqlite` feature"
            ))),
        }
    }

    /// Connect the node client and open storage. The provider starts stopped.
    pub async fn build(self) -> Result<BlockProvider<HttpChainClient>, IndexerError> {
        let client = HttpChainClient::from_config(&self.config)?;
        let db = self.open_database().await?;
        Ok(BlockProvider::new(client, db))
    }
}

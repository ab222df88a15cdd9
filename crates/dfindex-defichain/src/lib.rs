//! dfindex-defichain: DeFiChain projections on top of `dfindex-core`.
//!
//! - [`dftx`]: DfTx envelope extraction and payload codecs
//! - [`model`]: projection row types
//! - [`indexers`]: one indexer per projection, plus the DfTx fan-out
//! - [`registry`]: the ordered [`RootIndexer`]
//! - [`provider`]: the [`BlockProvider`] sync loop
//! - [`rpc`]: HTTP JSON-RPC node client
//! - [`mock`]: in-memory chain for tests

pub mod builder;
pub mod database;
pub mod dftx;
pub mod indexers;
pub mod mock;
pub mod model;
pub mod provider;
pub mod registry;
pub mod rpc;

pub use builder::IndexerBuilder;
pub use database::{Database, MemoryDatabase};
pub use provider::BlockProvider;
pub use registry::RootIndexer;
pub use rpc::HttpChainClient;

//! dfindex-core: foundation for the reorg-safe DeFiChain projection indexer.
//!
//! # Architecture
//!
//! ```text
//! BlockProvider (sync loop)
//!      ├── ChainClient       (node RPC: block count, hash, full block)
//!      ├── RootIndexer       (ordered list of entity Indexers)
//!      │     └── Indexer     (index / invalidate one projection)
//!      └── ProjectionStore   (sorted key/document store per entity)
//! ```
//!
//! This crate holds the chain-agnostic contracts; `dfindex-defichain` holds
//! the entity models, indexers and sync loop.

pub mod client;
pub mod cursor;
pub mod error;
pub mod indexer;
pub mod keys;
pub mod store;
pub mod types;

pub use client::ChainClient;
pub use cursor::Cursor;
pub use error::{ClientError, IndexerError, KeyError};
pub use indexer::{Indexer, IndexerConfig, SyncState};
pub use store::{Entity, Page, ProjectionStore, QueryOptions, SortOrder};
pub use types::{BlockContext, RawBlock, RawTransaction, RawVin, RawVout};

//! Entity indexers. Each owns one projection and implements
//! [`Indexer`](dfindex_core::Indexer) for it.

pub mod block;
pub mod dftx;
pub mod script_activity;
pub mod script_aggregation;
pub mod script_unspent;
pub mod transaction;
pub mod vout_finder;

pub use block::BlockIndexer;
pub use dftx::{DfTxIndexer, RootDfTxIndexer};
pub use script_activity::ScriptActivityIndexer;
pub use script_aggregation::ScriptAggregationIndexer;
pub use script_unspent::ScriptUnspentIndexer;
pub use transaction::{TransactionIndexer, TransactionVinIndexer, TransactionVoutIndexer};
pub use vout_finder::VoutFinder;

//! The set of projection stores the indexers write to.

use std::collections::BTreeMap;
use std::sync::Arc;

use dfindex_core::error::IndexerError;
use dfindex_core::store::{Entity, ProjectionStore};
use dfindex_storage::MemoryStore;

use crate::model::{
    AuctionBidModel, BlockModel, DexSwapModel, ScriptActivityModel, ScriptAggregationModel,
    ScriptUnspentModel, TokenModel, TransactionModel, TransactionVinModel, TransactionVoutModel,
};

/// Shared handle to one projection.
pub type Store<T> = Arc<dyn ProjectionStore<T>>;

/// One store per projection. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pub blocks: Store<BlockModel>,
    pub transactions: Store<TransactionModel>,
    pub transaction_vins: Store<TransactionVinModel>,
    pub transaction_vouts: Store<TransactionVoutModel>,
    pub script_activities: Store<ScriptActivityModel>,
    pub script_aggregations: Store<ScriptAggregationModel>,
    pub script_unspents: Store<ScriptUnspentModel>,
    pub tokens: Store<TokenModel>,
    pub dex_swaps: Store<DexSwapModel>,
    pub auction_bids: Store<AuctionBidModel>,
}

impl Database {
    pub fn in_memory() -> Self {
        MemoryDatabase::new().database()
    }

    /// Open (or create) a SQLite file with one table per projection.
    #[cfg(feature = "sqlite")]
    pub async fn sqlite(path: &str) -> Result<Self, IndexerError> {
        let db = dfindex_storage::sqlite::SqliteDatabase::open(path).await?;
        Self::from_sqlite(&db).await
    }

    #[cfg(feature = "sqlite")]
    pub async fn from_sqlite(
        db: &dfindex_storage::sqlite::SqliteDatabase,
    ) -> Result<Self, IndexerError> {
        Ok(Self {
            blocks: Arc::new(db.store().await?),
            transactions: Arc::new(db.store().await?),
            transaction_vins: Arc::new(db.store().await?),
            transaction_vouts: Arc::new(db.store().await?),
            script_activities: Arc::new(db.store().await?),
            script_aggregations: Arc::new(db.store().await?),
            script_unspents: Arc::new(db.store().await?),
            tokens: Arc::new(db.store().await?),
            dex_swaps: Arc::new(db.store().await?),
            auction_bids: Arc::new(db.store().await?),
        })
    }

    /// The highest indexed block, if any.
    pub async fn highest_block(&self) -> Result<Option<BlockModel>, IndexerError> {
        self.blocks.latest("").await
    }
}

/// In-memory stores with their concrete type kept, so tests can take
/// snapshots of the whole projection state.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    pub blocks: Arc<MemoryStore<BlockModel>>,
    pub transactions: Arc<MemoryStore<TransactionModel>>,
    pub transaction_vins: Arc<MemoryStore<TransactionVinModel>>,
    pub transaction_vouts: Arc<MemoryStore<TransactionVoutModel>>,
    pub script_activities: Arc<MemoryStore<ScriptActivityModel>>,
    pub script_aggregations: Arc<MemoryStore<ScriptAggregationModel>>,
    pub script_unspents: Arc<MemoryStore<ScriptUnspentModel>>,
    pub tokens: Arc<MemoryStore<TokenModel>>,
    pub dex_swaps: Arc<MemoryStore<DexSwapModel>>,
    pub auction_bids: Arc<MemoryStore<AuctionBidModel>>,
}

/// Every row of every projection, keyed by projection then id.
pub type Snapshot = BTreeMap<&'static str, BTreeMap<String, serde_json::Value>>;

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database(&self) -> Database {
        Database {
            blocks: self.blocks.clone(),
            transactions: self.transactions.clone(),
            transaction_vins: self.transaction_vins.clone(),
            transaction_vouts: self.transaction_vouts.clone(),
            script_activities: self.script_activities.clone(),
            script_aggregations: self.script_aggregations.clone(),
            script_unspents: self.script_unspents.clone(),
            tokens: self.tokens.clone(),
            dex_swaps: self.dex_swaps.clone(),
            auction_bids: self.auction_bids.clone(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        fn add<T: Entity>(out: &mut Snapshot, store: &MemoryStore<T>) {
            out.insert(T::KIND, store.snapshot());
        }
        let mut out = Snapshot::new();
        add(&mut out, &self.blocks);
        add(&mut out, &self.transactions);
        add(&mut out, &self.transaction_vins);
        add(&mut out, &self.transaction_vouts);
        add(&mut out, &self.script_activities);
        add(&mut out, &self.script_aggregations);
        add(&mut out, &self.script_unspents);
        add(&mut out, &self.tokens);
        add(&mut out, &self.dex_swaps);
        add(&mut out, &self.auction_bids);
        out
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use super::*;
    use crate::mock::BlockBuilder;
    use crate::RootIndexer;
    use dfindex_core::indexer::Indexer;
    use dfindex_core::keys;
    use dfindex_core::store::QueryOptions;
    use dfindex_storage::sqlite::SqliteDatabase;

    const S: &str = "00141111111111111111111111111111111111111111";
    const R: &str = "00142222222222222222222222222222222222222222";

    #[tokio::test]
    async fn pipeline_runs_on_sqlite() {
        let sqlite = SqliteDatabase::in_memory().await.unwrap();
        let db = Database::from_sqlite(&sqlite).await.unwrap();
        let root = RootIndexer::new(&db);

        let genesis = BlockBuilder::genesis().coinbase(&[(S, 5.0)]).build();
        let funding = genesis.tx[0].txid.clone();
        let b1 = BlockBuilder::child_of(&genesis)
            .transaction(&[(funding.as_str(), 0)], &[(R, 5.0)])
            .build();

        root.index(&genesis).await.unwrap();
        root.index(&b1).await.unwrap();
        assert_eq!(db.highest_block().await.unwrap().unwrap().hash, b1.hash);

        let hid = keys::hash_script(S).unwrap();
        let latest = db
            .script_aggregations
            .query(&hid, QueryOptions::desc(1))
            .await
            .unwrap()
            .items;
        assert_eq!(latest[0].block.height, 1);
        assert_eq!(latest[0].amount.unspent, "0.00000000");
        assert_eq!(latest[0].statistic.tx_count, 2);

        root.invalidate(&b1).await.unwrap();
        assert_eq!(db.highest_block().await.unwrap().unwrap().hash, genesis.hash);
        let unspent = db.script_unspents.query(&hid, QueryOptions::asc(10)).await.unwrap();
        assert_eq!(unspent.items.len(), 1);
    }
}

//! SQLite storage backend for dfindex.
//!
//! Each projection gets its own table of JSON documents with `partition_key` and
//! `sort_key` columns and a covering index, so range scans map onto a single
//! indexed `ORDER BY sort_key`. Uses `sqlx` with WAL mode.
//!
//! # Usage
//! ```rust,no_run
//! use dfindex_storage::sqlite::SqliteDatabase;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let db = SqliteDatabase::open("./dfindex.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let db = SqliteDatabase::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::marker::PhantomData;
use tracing::debug;

use dfindex_core::error::IndexerError;
use dfindex_core::store::{Entity, Page, ProjectionStore, QueryOptions, SortOrder};

/// A SQLite connection pool shared by all projection tables.
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./dfindex.db"`) or a full
    /// SQLite URL (`"sqlite:./dfindex.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, IndexerError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(IndexerError::storage)?;

        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&pool)
            .await
            .map_err(IndexerError::storage)?;

        Ok(Self { pool })
    }

    /// Open an in-memory SQLite database.
    ///
    /// A single connection is used so every table lives in the same memory
    /// database. All data is lost when the pool is dropped.
    pub async fn in_memory() -> Result<Self, IndexerError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(IndexerError::storage)?;
        Ok(Self { pool })
    }

    /// Create (if needed) the table for `T` and return a store over it.
    pub async fn store<T: Entity>(&self) -> Result<SqliteStore<T>, IndexerError> {
        let table = T::KIND;
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id            TEXT PRIMARY KEY,
                partition_key TEXT NOT NULL,
                sort_key      TEXT NOT NULL,
                doc           TEXT NOT NULL
            );"
        ))
        .execute(&self.pool)
        .await
        .map_err(IndexerError::storage)?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_partition_sort ON {table} (partition_key, sort_key);"
        ))
        .execute(&self.pool)
        .await
        .map_err(IndexerError::storage)?;

        debug!(table, "projection table ready");
        Ok(SqliteStore {
            pool: self.pool.clone(),
            _entity: PhantomData,
        })
    }
}

/// SQLite-backed store for one entity type.
pub struct SqliteStore<T> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> SqliteStore<T> {
    fn decode(doc: &str) -> Result<T, IndexerError> {
        serde_json::from_str(doc).map_err(IndexerError::storage)
    }
}

#[async_trait]
impl<T: Entity> ProjectionStore<T> for SqliteStore<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, IndexerError> {
        let row = sqlx::query(&format!("SELECT doc FROM {} WHERE id = ?", T::KIND))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(IndexerError::storage)?;

        row.map(|r| Self::decode(&r.get::<String, _>("doc"))).transpose()
    }

    async fn put(&self, record: &T) -> Result<(), IndexerError> {
        let doc = serde_json::to_string(record).map_err(IndexerError::storage)?;
        sqlx::query(&format!(
            "INSERT OR REPLACE INTO {} (id, partition_key, sort_key, doc) VALUES (?, ?, ?, ?)",
            T::KIND
        ))
        .bind(record.id())
        .bind(record.partition_key())
        .bind(record.sort_key())
        .bind(&doc)
        .execute(&self.pool)
        .await
        .map_err(IndexerError::storage)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), IndexerError> {
        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", T::KIND))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(IndexerError::storage)?;
        Ok(())
    }

    async fn query(&self, partition: &str, options: QueryOptions) -> Result<Page<T>, IndexerError> {
        let mut sql = format!("SELECT doc FROM {} WHERE partition_key = ?", T::KIND);
        let mut binds: Vec<String> = Vec::new();

        if let Some(gt) = &options.gt {
            sql.push_str(" AND sort_key > ?");
            binds.push(gt.clone());
        }
        if let Some(lt) = &options.lt {
            sql.push_str(" AND sort_key < ?");
            binds.push(lt.clone());
        }
        if let Some(next) = &options.next {
            sql.push_str(match options.order {
                SortOrder::Asc => " AND sort_key > ?",
                SortOrder::Desc => " AND sort_key < ?",
            });
            binds.push(next.clone());
        }
        sql.push_str(match options.order {
            SortOrder::Asc => " ORDER BY sort_key ASC",
            SortOrder::Desc => " ORDER BY sort_key DESC",
        });
        if options.limit > 0 {
            sql.push_str(&format!(" LIMIT {}", options.limit));
        }

        let mut query = sqlx::query(&sql).bind(partition);
        for value in &binds {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(IndexerError::storage)?;

        let items = rows
            .iter()
            .map(|r| Self::decode(&r.get::<String, _>("doc")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::from_items(items, options.limit))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

//! Projection storage contract.
//!
//! Every projection is a set of documents addressed three ways:
//! - `id`: identity, used by `get`/`put`/`delete`
//! - `partition_key`: groups rows that are range-scanned together
//! - `sort_key`: orders rows inside a partition (built with [`crate::keys`])
//!
//! Sort keys are unique within a partition; the pagination cursor relies on it.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::IndexerError;

/// A row type owned by exactly one indexer.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Projection name, e.g. `"script_aggregation"`. Used as table name.
    const KIND: &'static str;

    fn id(&self) -> String;
    fn partition_key(&self) -> String;
    fn sort_key(&self) -> String;
}

/// Scan direction over sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Range + page options for [`ProjectionStore::query`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub order: SortOrder,
    /// Maximum rows returned; `0` means unbounded.
    pub limit: usize,
    /// Exclusive lower bound on sort key.
    pub gt: Option<String>,
    /// Exclusive upper bound on sort key.
    pub lt: Option<String>,
    /// Continuation token from a previous [`Page`].
    pub next: Option<String>,
}

impl QueryOptions {
    pub fn desc(limit: usize) -> Self {
        Self {
            order: SortOrder::Desc,
            limit,
            ..Default::default()
        }
    }

    pub fn asc(limit: usize) -> Self {
        Self {
            order: SortOrder::Asc,
            limit,
            ..Default::default()
        }
    }

    pub fn gt(mut self, key: impl Into<String>) -> Self {
        self.gt = Some(key.into());
        self
    }

    pub fn lt(mut self, key: impl Into<String>) -> Self {
        self.lt = Some(key.into());
        self
    }

    pub fn after(mut self, next: Option<String>) -> Self {
        self.next = next;
        self
    }

    /// Returns `true` if `sort_key` falls inside the bounds and continuation.
    pub fn admits(&self, sort_key: &str) -> bool {
        if self.gt.as_deref().is_some_and(|gt| sort_key <= gt) {
            return false;
        }
        if self.lt.as_deref().is_some_and(|lt| sort_key >= lt) {
            return false;
        }
        match (self.next.as_deref(), self.order) {
            (Some(next), SortOrder::Asc) => sort_key > next,
            (Some(next), SortOrder::Desc) => sort_key < next,
            (None, _) => true,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Pass back as [`QueryOptions::next`] to fetch the following page.
    pub next: Option<String>,
}

impl<T: Entity> Page<T> {
    /// Build a page, setting `next` only when the page is full.
    pub fn from_items(items: Vec<T>, limit: usize) -> Self {
        let next = if limit > 0 && items.len() == limit {
            items.last().map(Entity::sort_key)
        } else {
            None
        };
        Self { items, next }
    }
}

/// Sorted key/document store for a single entity type.
#[async_trait]
pub trait ProjectionStore<T: Entity>: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<T>, IndexerError>;

    /// Insert or overwrite by `id`.
    async fn put(&self, record: &T) -> Result<(), IndexerError>;

    /// Remove by `id`. Deleting a missing row is not an error.
    async fn delete(&self, id: &str) -> Result<(), IndexerError>;

    async fn query(&self, partition: &str, options: QueryOptions) -> Result<Page<T>, IndexerError>;

    /// The row with the greatest sort key in `partition`.
    async fn latest(&self, partition: &str) -> Result<Option<T>, IndexerError> {
        let page = self.query(partition, QueryOptions::desc(1)).await?;
        Ok(page.items.into_iter().next())
    }
}

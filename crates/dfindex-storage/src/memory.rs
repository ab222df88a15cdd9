//! In-memory storage backend.
//!
//! Keeps each projection in RAM with a per-partition sorted index, so range
//! scans behave exactly like the persistent backends. Useful for testing and
//! short-lived indexers that don't need persistence.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use dfindex_core::error::IndexerError;
use dfindex_core::store::{Entity, Page, ProjectionStore, QueryOptions, SortOrder};

struct Inner<T> {
    rows: HashMap<String, T>,
    /// partition → (sort key, id)
    index: HashMap<String, BTreeSet<(String, String)>>,
}

impl<T: Entity> Inner<T> {
    fn unindex(&mut self, row: &T) {
        let partition = row.partition_key();
        if let Some(keys) = self.index.get_mut(&partition) {
            keys.remove(&(row.sort_key(), row.id()));
            if keys.is_empty() {
                self.index.remove(&partition);
            }
        }
    }
}

/// In-memory projection store for one entity type.
///
/// All data is lost when the process exits.
pub struct MemoryStore<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                rows: HashMap::new(),
                index: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<T>>, IndexerError> {
        self.inner
            .lock()
            .map_err(|_| IndexerError::Storage(format!("{} store lock poisoned", T::KIND)))
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every row serialized to JSON, keyed by id. Two snapshots compare equal
    /// exactly when the projection holds the same documents.
    pub fn snapshot(&self) -> BTreeMap<String, serde_json::Value> {
        let Ok(inner) = self.inner.lock() else {
            return BTreeMap::new();
        };
        inner
            .rows
            .iter()
            .map(|(id, row)| {
                let doc = serde_json::to_value(row).unwrap_or(serde_json::Value::Null);
                (id.clone(), doc)
            })
            .collect()
    }
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> ProjectionStore<T> for MemoryStore<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, IndexerError> {
        Ok(self.lock()?.rows.get(id).cloned())
    }

    async fn put(&self, record: &T) -> Result<(), IndexerError> {
        let mut inner = self.lock()?;
        let id = record.id();
        if let Some(previous) = inner.rows.remove(&id) {
            inner.unindex(&previous);
        }
        inner
            .index
            .entry(record.partition_key())
            .or_default()
            .insert((record.sort_key(), id.clone()));
        inner.rows.insert(id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), IndexerError> {
        let mut inner = self.lock()?;
        if let Some(previous) = inner.rows.remove(id) {
            inner.unindex(&previous);
        }
        Ok(())
    }

    async fn query(&self, partition: &str, options: QueryOptions) -> Result<Page<T>, IndexerError> {
        let inner = self.lock()?;
        let Some(keys) = inner.index.get(partition) else {
            return Ok(Page::from_items(vec![], options.limit));
        };

        let admitted = keys.iter().filter(|(sort, _)| options.admits(sort));
        let ids: Vec<&String> = match options.order {
            SortOrder::Asc => admitted.map(|(_, id)| id).collect(),
            SortOrder::Desc => admitted.rev().map(|(_, id)| id).collect(),
        };
        let take = if options.limit == 0 { ids.len() } else { options.limit };
        let items = ids
            .into_iter()
            .take(take)
            .filter_map(|id| inner.rows.get(id).cloned())
            .collect();
        Ok(Page::from_items(items, options.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        group: String,
        height: u64,
    }

    impl Entity for Row {
        const KIND: &'static str = "row";

        fn id(&self) -> String {
            self.id.clone()
        }
        fn partition_key(&self) -> String {
            self.group.clone()
        }
        fn sort_key(&self) -> String {
            format!("{:08x}", self.height)
        }
    }

    fn row(id: &str, group: &str, height: u64) -> Row {
        Row {
            id: id.into(),
            group: group.into(),
            height,
        }
    }

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryStore::new();
        store.put(&row("a", "g", 1)).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(row("a", "g", 1)));

        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.is_empty());

        // deleting again is fine
        store.delete("a").await.unwrap();
    }

    #[tokio::test]
    async fn put_overwrites_and_reindexes() {
        let store = MemoryStore::new();
        store.put(&row("a", "g", 1)).await.unwrap();
        store.put(&row("a", "g", 7)).await.unwrap();

        let page = store.query("g", QueryOptions::asc(0)).await.unwrap();
        assert_eq!(page.items, vec![row("a", "g", 7)]);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn query_orders_and_bounds() {
        let store = MemoryStore::new();
        for h in [5u64, 1, 16, 3, 256] {
            store.put(&row(&format!("r{h}"), "g", h)).await.unwrap();
        }
        store.put(&row("other", "h", 2)).await.unwrap();

        let desc = store.query("g", QueryOptions::desc(0)).await.unwrap();
        let heights: Vec<u64> = desc.items.iter().map(|r| r.height).collect();
        assert_eq!(heights, vec![256, 16, 5, 3, 1]);

        let below = store
            .query("g", QueryOptions::desc(1).lt(format!("{:08x}", 16)))
            .await
            .unwrap();
        assert_eq!(below.items[0].height, 5);

        assert_eq!(store.latest("g").await.unwrap().unwrap().height, 256);
        assert!(store.latest("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_paginates() {
        let store = MemoryStore::new();
        for h in 0u64..5 {
            store.put(&row(&format!("r{h}"), "g", h)).await.unwrap();
        }

        let first = store.query("g", QueryOptions::asc(2)).await.unwrap();
        assert_eq!(first.items.len(), 2);
        let second = store
            .query("g", QueryOptions::asc(2).after(first.next.clone()))
            .await
            .unwrap();
        assert_eq!(second.items[0].height, 2);
        let third = store
            .query("g", QueryOptions::asc(2).after(second.next.clone()))
            .await
            .unwrap();
        assert_eq!(third.items.len(), 1);
        assert!(third.next.is_none());
    }

    #[tokio::test]
    async fn snapshot_tracks_contents() {
        let store = MemoryStore::new();
        let empty = store.snapshot();
        store.put(&row("a", "g", 1)).await.unwrap();
        assert_ne!(store.snapshot(), empty);
        store.delete("a").await.unwrap();
        assert_eq!(store.snapshot(), empty);
    }
}

// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Provides a simple, fast state store that doesn't persist across restarts.
// Useful for testing and for embedding the reconciler in a process that
// keeps its own state.
//
// ## Crash Behavior
//
// - All tracked records are lost on restart/crash
// - The next run treats every record as untracked, so Create runs again;
//   conflict adoption turns that into a no-op for records that still exist

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::record::DnsRecord;
use crate::traits::state_store::{StateStore, TrackedRecord};
use crate::Error;

/// In-memory state store implementation
///
/// This implementation stores all state in a HashMap protected by a RwLock.
/// It provides no persistence across restarts.
///
/// # Example
///
/// ```rust,no_run
/// use zonesync_core::state::MemoryStateStore;
/// use zonesync_core::traits::StateStore;
/// use zonesync_core::DesiredRecord;
/// use zonesync_core::RecordId;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     let record = DesiredRecord::new("example.com", "www", "A", "1.2.3.4")
///         .to_record(RecordId::new(7));
///
///     store.put("www", &record).await?;
///     assert_eq!(store.get("www").await?.map(|t| t.record.id), Some(RecordId::new(7)));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<HashMap<String, TrackedRecord>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the number of tracked records
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<TrackedRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, record: &DnsRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(key.to_string(), TrackedRecord::new(record.clone()));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DesiredRecord, RecordId};

    fn record(id: i64, value: &str) -> DnsRecord {
        DesiredRecord::new("example.com", "www", "A", value).to_record(RecordId::new(id))
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStateStore::new();

        assert!(store.is_empty().await);

        store.put("www", &record(1, "1.2.3.4")).await.unwrap();
        assert_eq!(store.len().await, 1);

        let tracked = store.get("www").await.unwrap().unwrap();
        assert_eq!(tracked.record.id, RecordId::new(1));
        assert_eq!(tracked.record.value, "1.2.3.4");

        // Overwrite keeps one entry
        store.put("www", &record(2, "5.6.7.8")).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("www").await.unwrap().unwrap().record.id, RecordId::new(2));

        store.remove("www").await.unwrap();
        assert!(store.get("www").await.unwrap().is_none());

        // Removing again is fine
        store.remove("www").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_keys() {
        let store = MemoryStateStore::new();

        store.put("www", &record(1, "1.2.3.4")).await.unwrap();
        store.put("api", &record(2, "5.6.7.8")).await.unwrap();

        let keys = store.keys().await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"www".to_string()));
        assert!(keys.contains(&"api".to_string()));
    }
}

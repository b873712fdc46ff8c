// # State Store Trait
//
// Defines the interface for persisting tracked records between invocations.
//
// ## Purpose
//
// The reconciler itself is stateless. Whatever drives it (a declarative
// front end, the `zonesync` CLI) keeps the last-known snapshot of every
// managed record, keyed by a caller-chosen resource key, and hands it back
// to Read/Update/Delete on the next run.
//
// ## Implementations
//
// - Memory: tests and one-shot embedding
// - File: JSON file with atomic writes and backup recovery
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::StateStore;
//
// let tracked = store.get("www").await?;
// store.put("www", &record).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::record::DnsRecord;

/// Last-known snapshot of one managed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedRecord {
    /// The record as of the last successful reconciliation
    pub record: DnsRecord,
    /// When that reconciliation happened
    pub last_synced: chrono::DateTime<chrono::Utc>,
}

impl TrackedRecord {
    /// Snapshot `record` now
    pub fn new(record: DnsRecord) -> Self {
        Self {
            record,
            last_synced: chrono::Utc::now(),
        }
    }

    /// Check if the snapshot is older than `max_age`
    pub fn is_stale(&self, max_age: chrono::Duration) -> bool {
        chrono::Utc::now().signed_duration_since(self.last_synced) > max_age
    }
}

/// Trait for state store implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the tracked record stored under `key`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(TrackedRecord))`: The snapshot
    /// - `Ok(None)`: Nothing tracked under that key
    /// - `Err(Error)`: Storage error
    async fn get(&self, key: &str) -> Result<Option<TrackedRecord>, crate::Error>;

    /// Store a fresh snapshot of `record` under `key`
    async fn put(&self, key: &str, record: &DnsRecord) -> Result<(), crate::Error>;

    /// Stop tracking `key`
    ///
    /// Succeeds when nothing was tracked.
    async fn remove(&self, key: &str) -> Result<(), crate::Error>;

    /// List all tracked keys
    async fn keys(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

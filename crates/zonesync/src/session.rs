//! One reconciler operation per invocation
//!
//! The reconciler is stateless. A [`Session`] pairs it with the state store
//! that remembers, per resource key, the record as of the last run.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use zonesync_core::identity::matches;
use zonesync_core::{
    ApplyAction, DesiredRecord, DnsRecord, ReadOutcome, Reconciler, StateStore, Warning,
};

/// What an operation did to one resource key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A new remote record now backs the key
    Created,
    /// An existing remote record was taken over as-is
    Adopted,
    /// An existing remote record was taken over and updated
    UpdatedExisting,
    /// The tracked record was updated in place
    Updated,
    /// The tracked record moved zone: old one deleted, new one created
    Replaced,
    /// Nothing to do
    Unchanged,
    /// The snapshot was refreshed from the remote
    Refreshed,
    /// The record is gone remotely and no longer tracked
    Dropped,
    /// The record was deleted and is no longer tracked
    Destroyed,
    /// An existing remote record is now tracked
    Imported,
}

impl From<ApplyAction> for Change {
    fn from(action: ApplyAction) -> Self {
        match action {
            ApplyAction::Created => Change::Created,
            ApplyAction::Adopted => Change::Adopted,
            ApplyAction::UpdatedExisting => Change::UpdatedExisting,
        }
    }
}

/// Outcome of an operation on one resource key
#[derive(Debug, Clone)]
pub struct Report {
    /// Resource key
    pub key: String,
    /// What happened
    pub change: Change,
    /// Record now tracked under the key, if any
    pub record: Option<DnsRecord>,
    /// Notes for the user
    pub warnings: Vec<Warning>,
}

impl Report {
    fn new(key: &str, change: Change, record: Option<DnsRecord>) -> Self {
        Self {
            key: key.to_string(),
            change,
            record,
            warnings: Vec::new(),
        }
    }

    fn with_warnings(mut self, warnings: Vec<Warning>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    /// Machine-readable form printed by the CLI
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "key": self.key,
            "change": format!("{:?}", self.change),
            "record": self.record,
            "warnings": self
                .warnings
                .iter()
                .map(|w| serde_json::json!({"summary": w.summary, "detail": w.detail}))
                .collect::<Vec<_>>(),
        })
    }
}

/// Reconciler plus tracked-record persistence
pub struct Session {
    reconciler: Reconciler,
    store: Arc<dyn StateStore>,
}

impl Session {
    pub fn new(reconciler: Reconciler, store: Arc<dyn StateStore>) -> Self {
        Self { reconciler, store }
    }

    /// Converge the record tracked under `key` to `desired`
    ///
    /// Untracked keys go through Create, which adopts an existing remote
    /// record with the same identity. Tracked keys are read first so that a
    /// drifted identifier is recovered before anything is changed.
    pub async fn apply(&self, key: &str, desired: &DesiredRecord) -> Result<Report> {
        let Some(tracked) = self.store.get(key).await? else {
            return self.create(key, desired, Vec::new()).await;
        };
        let tracked = tracked.record;

        let (current, warnings) = match self.reconciler.read(&tracked).await? {
            ReadOutcome::Present {
                record, warnings, ..
            } => (record, warnings),
            ReadOutcome::Absent { reason } => {
                warn!("Tracked record {} is gone, recreating: {}", key, reason);
                self.store.remove(key).await?;
                return self.create(key, desired, Vec::new()).await;
            }
        };

        if current.zone != desired.zone {
            info!(
                "Record {} moves from zone {} to {}",
                key, current.zone, desired.zone
            );
            let deleted = self.reconciler.delete(&current).await?;
            self.store.remove(key).await?;
            let mut report = self.create(key, desired, warnings).await?;
            report.change = Change::Replaced;
            return Ok(report.with_warnings(deleted.warnings));
        }

        if matches(&current, desired) && current.satisfies(desired) {
            self.track(key, &current).await?;
            return Ok(Report::new(key, Change::Unchanged, Some(current)).with_warnings(warnings));
        }

        let updated = self.reconciler.update(&current, desired).await?;
        self.track(key, &updated).await?;
        Ok(Report::new(key, Change::Updated, Some(updated)).with_warnings(warnings))
    }

    /// Refresh the snapshot of one key, or of every tracked key
    pub async fn refresh(&self, key: Option<&str>) -> Result<Vec<Report>> {
        let keys = match key {
            Some(key) => vec![key.to_string()],
            None => self.store.keys().await?,
        };

        let mut reports = Vec::with_capacity(keys.len());
        for key in keys {
            let tracked = self
                .store
                .get(&key)
                .await?
                .with_context(|| format!("nothing is tracked under '{}'", key))?;

            let report = match self.reconciler.read(&tracked.record).await? {
                ReadOutcome::Present {
                    record, warnings, ..
                } => {
                    self.track(&key, &record).await?;
                    Report::new(&key, Change::Refreshed, Some(record)).with_warnings(warnings)
                }
                ReadOutcome::Absent { reason } => {
                    warn!("Record {} is gone, no longer tracking it: {}", key, reason);
                    self.store.remove(&key).await?;
                    Report::new(&key, Change::Dropped, None)
                }
            };
            reports.push(report);
        }

        self.store.flush().await?;
        Ok(reports)
    }

    /// Delete the record tracked under `key` and stop tracking it
    pub async fn destroy(&self, key: &str) -> Result<Report> {
        let tracked = self
            .store
            .get(key)
            .await?
            .with_context(|| format!("nothing is tracked under '{}'", key))?;

        let deleted = self.reconciler.delete(&tracked.record).await?;
        self.store.remove(key).await?;
        self.store.flush().await?;
        Ok(Report::new(key, Change::Destroyed, None).with_warnings(deleted.warnings))
    }

    /// Start tracking an existing remote record under `key`
    pub async fn import(&self, key: &str, zone: &str, id: &str) -> Result<Report> {
        if self.store.get(key).await?.is_some() {
            anyhow::bail!("'{}' is already tracked; destroy or pick another key", key);
        }

        let record = self.reconciler.import(zone, id).await?;
        self.track(key, &record).await?;
        Ok(Report::new(key, Change::Imported, Some(record)))
    }

    /// Every record of `zone`
    pub async fn zone(&self, zone: &str) -> Result<Vec<DnsRecord>> {
        Ok(self.reconciler.list_zone(zone).await?)
    }

    async fn create(&self, key: &str, desired: &DesiredRecord, warnings: Vec<Warning>) -> Result<Report> {
        let applied = self.reconciler.create(desired).await?;
        self.track(key, &applied.record).await?;
        Ok(Report::new(key, applied.action.into(), Some(applied.record))
            .with_warnings(warnings)
            .with_warnings(applied.warnings))
    }

    async fn track(&self, key: &str, record: &DnsRecord) -> Result<()> {
        self.store.put(key, record).await?;
        self.store.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use std::sync::Mutex;
    use zonesync_core::traits::{DeleteOutcome, LookupOutcome, RemoteDirectory};
    use zonesync_core::{DnsZone, MemoryStateStore, RecordId, ReconcilerConfig};

    /// Single-zone directory that assigns increasing identifiers
    #[derive(Default)]
    struct Directory {
        records: Mutex<Vec<DnsRecord>>,
        next_id: Mutex<i64>,
    }

    #[async_trait]
    impl RemoteDirectory for Directory {
        async fn fetch_zone(&self, zone: &str) -> LookupOutcome<DnsZone> {
            LookupOutcome::Found(DnsZone {
                name: zone.to_string(),
                records: self
                    .records
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|r| r.zone == zone)
                    .cloned()
                    .collect(),
            })
        }

        async fn create_record(&self, desired: &DesiredRecord) -> zonesync_core::Result<DnsRecord> {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let record = desired.to_record(RecordId::new(*next));
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn update_record(&self, record: &DnsRecord) -> zonesync_core::Result<DnsRecord> {
            let mut records = self.records.lock().unwrap();
            let slot = records
                .iter_mut()
                .find(|r| r.id == record.id)
                .ok_or_else(|| zonesync_core::Error::not_found("Record not found"))?;
            *slot = record.clone();
            Ok(record.clone())
        }

        async fn delete_record(
            &self,
            _zone: &str,
            id: RecordId,
        ) -> zonesync_core::Result<DeleteOutcome> {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| r.id != id);
            if records.len() == before {
                return Ok(DeleteOutcome::AlreadyAbsent("Record not found".to_string()));
            }
            Ok(DeleteOutcome::Deleted)
        }

        fn provider_name(&self) -> &'static str {
            "test"
        }
    }

    fn session() -> (Session, Arc<Directory>, Arc<MemoryStateStore>) {
        let directory = Arc::new(Directory::default());
        let store = Arc::new(MemoryStateStore::new());
        let reconciler = Reconciler::new(directory.clone(), ReconcilerConfig::default());
        (Session::new(reconciler, store.clone()), directory, store)
    }

    fn www(value: &str) -> DesiredRecord {
        DesiredRecord::new("example.com", "www", "A", value)
    }

    #[tokio::test]
    async fn apply_creates_then_is_unchanged() {
        let (session, directory, store) = session();

        let first = session.apply("web", &www("1.2.3.4")).await.unwrap();
        assert_eq!(first.change, Change::Created);

        let second = session.apply("web", &www("1.2.3.4")).await.unwrap();
        assert_eq!(second.change, Change::Unchanged);

        assert_eq!(directory.records.lock().unwrap().len(), 1);
        assert!(store.get("web").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn apply_updates_in_place() {
        let (session, directory, _) = session();
        session.apply("web", &www("1.2.3.4")).await.unwrap();

        let report = session.apply("web", &www("5.6.7.8")).await.unwrap();

        assert_eq!(report.change, Change::Updated);
        let records = directory.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "5.6.7.8");
    }

    #[tokio::test]
    async fn apply_recreates_a_record_deleted_out_of_band() {
        let (session, directory, store) = session();
        session.apply("web", &www("1.2.3.4")).await.unwrap();
        directory.records.lock().unwrap().clear();

        let report = session.apply("web", &www("1.2.3.4")).await.unwrap();

        assert_eq!(report.change, Change::Created);
        let tracked = store.get("web").await.unwrap().unwrap();
        assert_eq!(tracked.record.id, RecordId::new(2));
    }

    #[tokio::test]
    async fn apply_moves_zone() {
        let (session, directory, _) = session();
        session.apply("web", &www("1.2.3.4")).await.unwrap();

        let moved = DesiredRecord::new("example.org", "www", "A", "1.2.3.4");
        let report = session.apply("web", &moved).await.unwrap();

        assert_eq!(report.change, Change::Replaced);
        let records = directory.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].zone, "example.org");
    }

    #[tokio::test]
    async fn refresh_drops_vanished_records() {
        let (session, directory, store) = session();
        session.apply("web", &www("1.2.3.4")).await.unwrap();
        directory.records.lock().unwrap().clear();

        let reports = session.refresh(None).await.unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].change, Change::Dropped);
        assert!(store.get("web").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn destroy_is_idempotent_remotely() {
        let (session, directory, store) = session();
        session.apply("web", &www("1.2.3.4")).await.unwrap();
        directory.records.lock().unwrap().clear();

        let report = session.destroy("web").await.unwrap();

        assert_eq!(report.change, Change::Destroyed);
        assert_eq!(report.warnings.len(), 1);
        assert!(store.get("web").await.unwrap().is_none());
        assert!(session.destroy("web").await.is_err());
    }

    #[tokio::test]
    async fn import_tracks_existing_record() {
        let (session, _, store) = session();
        session.apply("web", &www("1.2.3.4")).await.unwrap();

        let report = session.import("copy", "example.com", "1").await.unwrap();

        assert_eq!(report.change, Change::Imported);
        assert_eq!(store.get("copy").await.unwrap().unwrap().record.name, "www");
        assert!(session.import("copy", "example.com", "1").await.is_err());
    }

    #[test]
    fn report_json_shape() {
        let report = Report::new("web", Change::Adopted, None)
            .with_warnings(vec![Warning::new("Adopted Existing DNS Record", "www")]);
        let json = report.to_json();
        assert_eq!(json["change"], "Adopted");
        assert_eq!(json["warnings"][0]["summary"], "Adopted Existing DNS Record");
        assert!(json["record"].is_null());
    }
}

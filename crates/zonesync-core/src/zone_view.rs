//! Per-operation snapshot of a zone
//!
//! A [`ZoneView`] wraps one fetched [`DnsZone`] so an operation can search it
//! by identity and by identifier as often as it needs without fetching the
//! zone again. It is built inside an operation and dropped at its end; it is
//! never shared between operations.

use std::collections::HashMap;
use tracing::warn;

use crate::identity::{Identified, RecordKey};
use crate::record::{DnsRecord, DnsZone, RecordId};

/// Read-only index over one zone snapshot
#[derive(Debug, Clone)]
pub struct ZoneView {
    zone: String,
    records: Vec<DnsRecord>,
    by_identity: HashMap<RecordKey, Vec<usize>>,
}

impl ZoneView {
    /// Index a fetched zone
    ///
    /// Every record is stamped with `zone`, the caller's zone name, whatever
    /// the provider echoed.
    pub fn new(zone: impl Into<String>, snapshot: DnsZone) -> Self {
        let zone = zone.into();
        let records: Vec<DnsRecord> = snapshot
            .records
            .into_iter()
            .map(|r| r.in_zone(zone.clone()))
            .collect();

        let mut by_identity: HashMap<RecordKey, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_identity.entry(record.identity()).or_default().push(idx);
        }

        Self {
            zone,
            records,
            by_identity,
        }
    }

    /// Zone name
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// All records, remote order
    pub fn records(&self) -> &[DnsRecord] {
        &self.records
    }

    /// Consume the view
    pub fn into_records(self) -> Vec<DnsRecord> {
        self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the zone has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find the record denoting the same DNS entry as `wanted`
    ///
    /// When the provider holds duplicates, the first one (remote order) with
    /// a valid identifier wins, falling back to the first one at all.
    pub fn find_by_identity<T: Identified + ?Sized>(&self, wanted: &T) -> Option<&DnsRecord> {
        let key = wanted.identity();
        let candidates = self.by_identity.get(&key)?;

        if candidates.len() > 1 {
            let ids: Vec<String> = candidates
                .iter()
                .map(|&i| self.records[i].id.to_string())
                .collect();
            warn!(
                "Zone {} holds {} records for {}: IDs [{}]",
                self.zone,
                candidates.len(),
                key,
                ids.join(", ")
            );
        }

        candidates
            .iter()
            .map(|&i| &self.records[i])
            .find(|r| r.id.is_valid())
            .or_else(|| candidates.first().map(|&i| &self.records[i]))
    }

    /// Find a record by identifier
    pub fn find_by_id(&self, id: RecordId) -> Option<&DnsRecord> {
        if !id.is_valid() {
            return None;
        }
        self.records.iter().find(|r| r.id == id)
    }
}

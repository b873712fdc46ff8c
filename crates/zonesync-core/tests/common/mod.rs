//! Test doubles and common utilities for reconciler contract tests
//!
//! [`FakeDirectory`] keeps a zone in memory and misbehaves on demand the
//! ways a real provider does: renumbering records, echoing the wrong zone,
//! omitting identifiers, listing stale data, failing transiently.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use zonesync_core::error::{Error, Result};
use zonesync_core::identity;
use zonesync_core::traits::{DeleteOutcome, LookupOutcome, RemoteDirectory};
use zonesync_core::{DesiredRecord, DnsRecord, DnsZone, ReconcilerConfig, Reconciler, RecordId};

pub const ZONE: &str = "example.com";

#[derive(Default)]
struct FakeState {
    records: Vec<DnsRecord>,
    next_id: i64,
    /// Zone written into every echoed record
    echo_zone: String,
    /// Fetches answer NotFound
    zone_missing: bool,
    /// Fetches fail with a transient error
    fetch_fails: bool,
    /// The next N fetches list an empty zone
    stale_fetches: usize,
    /// Creates are rejected as conflicts whatever the zone holds
    always_conflict: bool,
    /// Created records come back with ID 0
    omit_id_on_create: bool,
    /// Deletes fail with an API error
    delete_fails: bool,
}

/// Call counters, shared between clones
#[derive(Default)]
pub struct Calls {
    pub fetch: AtomicUsize,
    pub create: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
}

impl Calls {
    pub fn fetch(&self) -> usize {
        self.fetch.load(Ordering::SeqCst)
    }

    pub fn create(&self) -> usize {
        self.create.load(Ordering::SeqCst)
    }

    pub fn update(&self) -> usize {
        self.update.load(Ordering::SeqCst)
    }

    pub fn delete(&self) -> usize {
        self.delete.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.fetch() + self.create() + self.update() + self.delete()
    }
}

/// In-memory remote directory holding a single zone
#[derive(Clone)]
pub struct FakeDirectory {
    state: Arc<Mutex<FakeState>>,
    pub calls: Arc<Calls>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                next_id: 100,
                echo_zone: ZONE.to_string(),
                ..Default::default()
            })),
            calls: Arc::new(Calls::default()),
        }
    }

    /// Add a record as if someone created it outside zonesync
    pub fn seed(&self, id: i64, name: &str, record_type: &str, value: &str, ttl: u32) {
        self.state.lock().unwrap().records.push(DnsRecord {
            id: RecordId::new(id),
            name: name.to_string(),
            record_type: record_type.to_string(),
            value: value.to_string(),
            ttl,
            zone: ZONE.to_string(),
        });
    }

    /// Give a record a new identifier, the way the provider sometimes does
    pub fn renumber(&self, old: i64, new: i64) {
        let mut state = self.state.lock().unwrap();
        for record in state.records.iter_mut() {
            if record.id == RecordId::new(old) {
                record.id = RecordId::new(new);
            }
        }
    }

    pub fn records(&self) -> Vec<DnsRecord> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn echo_zone(&self, zone: &str) {
        self.state.lock().unwrap().echo_zone = zone.to_string();
    }

    pub fn zone_missing(&self, missing: bool) {
        self.state.lock().unwrap().zone_missing = missing;
    }

    pub fn fetch_fails(&self, fails: bool) {
        self.state.lock().unwrap().fetch_fails = fails;
    }

    pub fn stale_fetches(&self, n: usize) {
        self.state.lock().unwrap().stale_fetches = n;
    }

    pub fn always_conflict(&self, conflict: bool) {
        self.state.lock().unwrap().always_conflict = conflict;
    }

    pub fn omit_id_on_create(&self, omit: bool) {
        self.state.lock().unwrap().omit_id_on_create = omit;
    }

    pub fn delete_fails(&self, fails: bool) {
        self.state.lock().unwrap().delete_fails = fails;
    }

    fn echo(state: &FakeState, record: &DnsRecord) -> DnsRecord {
        record.clone().in_zone(state.echo_zone.clone())
    }
}

#[async_trait::async_trait]
impl RemoteDirectory for FakeDirectory {
    async fn fetch_zone(&self, zone: &str) -> LookupOutcome<DnsZone> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();

        if state.fetch_fails {
            return LookupOutcome::Failed(Error::Transient {
                attempts: 4,
                message: "HTTP 503 Service Unavailable".to_string(),
            });
        }
        if state.zone_missing {
            return LookupOutcome::NotFound(format!("Domain {} not found", zone));
        }
        if state.stale_fetches > 0 {
            state.stale_fetches -= 1;
            return LookupOutcome::Found(DnsZone {
                name: zone.to_string(),
                records: Vec::new(),
            });
        }

        let records = state.records.iter().map(|r| Self::echo(&state, r)).collect();
        LookupOutcome::Found(DnsZone {
            name: zone.to_string(),
            records,
        })
    }

    async fn create_record(&self, desired: &DesiredRecord) -> Result<DnsRecord> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();

        if state.always_conflict
            || state.records.iter().any(|r| identity::matches(r, desired))
        {
            return Err(Error::conflict("Cannot add record: already exists"));
        }

        let id = RecordId::new(state.next_id);
        state.next_id += 1;
        let record = desired.to_record(id);
        state.records.push(record.clone());

        let mut echoed = Self::echo(&state, &record);
        if state.omit_id_on_create {
            echoed.id = RecordId::UNASSIGNED;
        }
        Ok(echoed)
    }

    async fn update_record(&self, record: &DnsRecord) -> Result<DnsRecord> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();

        let Some(existing) = state.records.iter_mut().find(|r| r.id == record.id) else {
            return Err(Error::not_found(format!("Record with ID {} not found", record.id)));
        };

        existing.name = record.name.clone();
        existing.record_type = record.record_type.clone();
        existing.value = record.value.clone();
        existing.ttl = record.ttl;
        let updated = existing.clone();

        Ok(Self::echo(&state, &updated))
    }

    async fn delete_record(&self, _zone: &str, id: RecordId) -> Result<DeleteOutcome> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();

        if state.delete_fails {
            return Err(Error::api(500, "Internal error while deleting"));
        }

        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        if state.records.len() == before {
            return Ok(DeleteOutcome::AlreadyAbsent(format!("Record with ID {} not found", id)));
        }
        Ok(DeleteOutcome::Deleted)
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// A reconciler over `directory` with default settings
pub fn reconciler(directory: &FakeDirectory) -> Reconciler {
    reconciler_with(directory, ReconcilerConfig::default())
}

pub fn reconciler_with(directory: &FakeDirectory, config: ReconcilerConfig) -> Reconciler {
    Reconciler::new(Arc::new(directory.clone()), config)
}

/// A desired A record in [`ZONE`]
pub fn desired(name: &str, value: &str) -> DesiredRecord {
    DesiredRecord::new(ZONE, name, "A", value)
}

/// A tracked record as the front end would have stored it
pub fn tracked(id: i64, name: &str, record_type: &str, value: &str) -> DnsRecord {
    DnsRecord {
        id: RecordId::new(id),
        name: name.to_string(),
        record_type: record_type.to_string(),
        value: value.to_string(),
        ttl: 3600,
        zone: ZONE.to_string(),
    }
}

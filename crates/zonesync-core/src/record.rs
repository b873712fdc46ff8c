//! Record and zone data model
//!
//! A [`DnsRecord`] is what the provider holds, a [`DesiredRecord`] is what
//! the caller wants. The caller's zone is authoritative for both.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::identity::Identified;

/// TTL sent when the caller leaves it unset
pub const DEFAULT_TTL: u32 = 3600;

/// Provider-assigned record identifier
///
/// The provider hands out positive integers. Zero stands for "not assigned
/// yet"; anything non-positive cannot be used to address a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// The identifier of a record that has not been created yet
    pub const UNASSIGNED: Self = Self(0);

    /// Wrap a raw identifier
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw value
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Whether the identifier can address a remote record
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }

    /// Parse an identifier leniently
    ///
    /// Tracked state may carry an empty or garbled identifier. Instead of
    /// failing, those map to [`RecordId::UNASSIGNED`] so the caller can fall
    /// back to drift recovery.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Self::UNASSIGNED)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| crate::Error::validation(format!("invalid record ID '{}': {}", s, e)))
    }
}

impl From<i64> for RecordId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// A DNS record as known to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned identifier, may drift over the record's lifetime
    #[serde(default)]
    pub id: RecordId,
    /// Record name relative to the zone (e.g. "www")
    pub name: String,
    /// Record type (A, AAAA, CNAME, MX, TXT, ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record value
    pub value: String,
    /// Time-to-live in seconds
    #[serde(default)]
    pub ttl: u32,
    /// Zone the record lives in
    #[serde(default)]
    pub zone: String,
}

impl DnsRecord {
    /// Return a copy placed in `zone`, whatever the source said
    pub fn in_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    /// Whether the remote value and TTL already satisfy `desired`
    ///
    /// A desired record without a TTL accepts whatever TTL the remote has.
    pub fn satisfies(&self, desired: &DesiredRecord) -> bool {
        self.value == desired.value && desired.ttl.is_none_or(|ttl| ttl == self.ttl)
    }
}

impl Identified for DnsRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn record_type(&self) -> &str {
        &self.record_type
    }
}

/// A zone and its records, fetched fresh for one operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsZone {
    /// Zone name
    pub name: String,
    /// Records in remote order
    #[serde(default)]
    pub records: Vec<DnsRecord>,
}

/// The record a caller wants to exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRecord {
    /// Record name relative to the zone
    pub name: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record value
    pub value: String,
    /// TTL in seconds, provider default when unset
    #[serde(default)]
    pub ttl: Option<u32>,
    /// Zone, authoritative
    pub zone: String,
}

impl DesiredRecord {
    /// Create a desired record
    pub fn new(
        zone: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            value: value.into(),
            ttl: None,
            zone: zone.into(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// The TTL that will be sent to the provider
    pub fn effective_ttl(&self) -> u32 {
        self.ttl.unwrap_or(DEFAULT_TTL)
    }

    /// Turn into a record addressed by `id`
    pub fn to_record(&self, id: RecordId) -> DnsRecord {
        DnsRecord {
            id,
            name: self.name.clone(),
            record_type: self.record_type.clone(),
            value: self.value.clone(),
            ttl: self.effective_ttl(),
            zone: self.zone.clone(),
        }
    }

    /// Check required fields
    pub fn validate(&self) -> crate::Result<()> {
        if self.zone.trim().is_empty() {
            return Err(crate::Error::validation("zone cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(crate::Error::validation("record name cannot be empty"));
        }
        if self.record_type.trim().is_empty() {
            return Err(crate::Error::validation("record type cannot be empty"));
        }
        if self.value.trim().is_empty() {
            return Err(crate::Error::validation("record value cannot be empty"));
        }
        Ok(())
    }
}

impl Identified for DesiredRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn record_type(&self) -> &str {
        &self.record_type
    }
}

impl From<&DnsRecord> for DesiredRecord {
    fn from(record: &DnsRecord) -> Self {
        Self {
            name: record.name.clone(),
            record_type: record.record_type.clone(),
            value: record.value.clone(),
            ttl: Some(record.ttl),
            zone: record.zone.clone(),
        }
    }
}

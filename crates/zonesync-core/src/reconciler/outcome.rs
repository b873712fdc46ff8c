//! Results of reconciler operations
//!
//! Every successful operation may carry [`Warning`]s: non-fatal notes the
//! caller should surface to the user (adoption, drift, a delete that found
//! nothing to delete).

use std::fmt;

use crate::record::{DnsRecord, RecordId};

/// A non-fatal note attached to a successful operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Short title
    pub summary: String,
    /// Full explanation naming the record
    pub detail: String,
}

impl Warning {
    /// Create a warning
    pub fn new(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.summary, self.detail)
    }
}

/// How Create reached the desired state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    /// A new remote record was created
    Created,
    /// An identical remote record already existed and was taken over
    Adopted,
    /// A remote record with the same identity existed and was updated in place
    UpdatedExisting,
}

impl fmt::Display for ApplyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplyAction::Created => "created",
            ApplyAction::Adopted => "adopted",
            ApplyAction::UpdatedExisting => "updated existing",
        };
        f.write_str(s)
    }
}

/// Successful Create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// The record now tracked, with a valid identifier and the caller's zone
    pub record: DnsRecord,
    /// What happened remotely
    pub action: ApplyAction,
    /// Notes for the user
    pub warnings: Vec<Warning>,
}

/// Successful Read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The record exists remotely
    Present {
        /// Refreshed record, caller's zone preserved
        record: DnsRecord,
        /// The tracked identifier when the record was found under a new one
        recovered_from: Option<RecordId>,
        /// Notes for the user
        warnings: Vec<Warning>,
    },
    /// The record is gone; the caller should stop tracking it
    Absent {
        /// Why the record is considered gone
        reason: String,
    },
}

impl ReadOutcome {
    /// The refreshed record, if present
    pub fn record(&self) -> Option<&DnsRecord> {
        match self {
            ReadOutcome::Present { record, .. } => Some(record),
            ReadOutcome::Absent { .. } => None,
        }
    }

    /// Whether the record was found under a different identifier
    pub fn drifted(&self) -> bool {
        matches!(
            self,
            ReadOutcome::Present {
                recovered_from: Some(_),
                ..
            }
        )
    }
}

/// Successful Delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deleted {
    /// The provider reported the record as already gone
    pub already_absent: bool,
    /// Notes for the user
    pub warnings: Vec<Warning>,
}

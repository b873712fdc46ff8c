// # Remote Directory Trait
//
// Defines the interface to the provider API that holds the zones.
//
// ## Implementations
//
// - LWS: `zonesync-provider-lws` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::traits::{LookupOutcome, RemoteDirectory};
//
// async fn count(directory: &dyn RemoteDirectory) -> usize {
//     match directory.fetch_zone("example.com").await {
//         LookupOutcome::Found(zone) => zone.records.len(),
//         LookupOutcome::NotFound(_) | LookupOutcome::Failed(_) => 0,
//     }
// }
// ```

use async_trait::async_trait;

use crate::record::{DesiredRecord, DnsRecord, DnsZone, RecordId};

/// Outcome of a lookup against the provider
///
/// Not-found is an answer here, not an error: callers branch on it (drift
/// recovery, absence) instead of matching error text.
#[derive(Debug)]
pub enum LookupOutcome<T> {
    /// The target exists
    Found(T),
    /// The provider says the target does not exist
    NotFound(String),
    /// The lookup could not be completed
    Failed(crate::Error),
}

impl<T> LookupOutcome<T> {
    /// Map the found value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LookupOutcome<U> {
        match self {
            Self::Found(v) => LookupOutcome::Found(f(v)),
            Self::NotFound(detail) => LookupOutcome::NotFound(detail),
            Self::Failed(e) => LookupOutcome::Failed(e),
        }
    }

    /// Collapse into a `Result`, not-found becoming [`crate::Error::NotFound`]
    pub fn into_result(self) -> crate::Result<T> {
        match self {
            Self::Found(v) => Ok(v),
            Self::NotFound(detail) => Err(crate::Error::NotFound(detail)),
            Self::Failed(e) => Err(e),
        }
    }
}

impl<T> From<crate::Result<T>> for LookupOutcome<T> {
    fn from(result: crate::Result<T>) -> Self {
        match result {
            Ok(v) => Self::Found(v),
            Err(crate::Error::NotFound(detail)) => Self::NotFound(detail),
            Err(e) => Self::Failed(e),
        }
    }
}

/// Outcome of a delete call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record was removed by this call
    Deleted,
    /// The provider says the record was already gone
    AlreadyAbsent(String),
}

/// Trait for remote directory implementations
///
/// One implementation wraps one provider account. Implementations own
/// their transport, authentication and retry policy.
///
/// # Thread Safety
///
/// Implementations must be usable across async tasks. An implementation may
/// serialize its own calls internally; callers must not assume that two
/// calls on the same instance run in parallel.
///
/// # Error Mapping
///
/// Implementations translate provider-specific failures into typed results
/// at this boundary:
///
/// - a create rejected because the record already exists → [`crate::Error::Conflict`]
/// - a missing zone or record → [`LookupOutcome::NotFound`],
///   [`DeleteOutcome::AlreadyAbsent`] or [`crate::Error::NotFound`]
/// - exhausted retries → [`crate::Error::Transient`]
/// - garbage instead of an API response → [`crate::Error::UnparseableResponse`]
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Fetch every record of a zone
    ///
    /// The returned records may carry an empty or wrong zone; callers stamp
    /// their own.
    async fn fetch_zone(&self, zone: &str) -> LookupOutcome<DnsZone>;

    /// Create a record
    ///
    /// Implementations must return the created record with its identifier,
    /// discovering it with a follow-up lookup when the provider does not echo
    /// one.
    async fn create_record(&self, desired: &DesiredRecord) -> crate::Result<DnsRecord>;

    /// Update the record addressed by `record.id` with the other fields of
    /// `record`
    async fn update_record(&self, record: &DnsRecord) -> crate::Result<DnsRecord>;

    /// Delete the record `id` from `zone`
    async fn delete_record(&self, zone: &str, id: RecordId) -> crate::Result<DeleteOutcome>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing remote directories from configuration
pub trait RemoteDirectoryFactory: Send + Sync {
    /// Create a RemoteDirectory instance from configuration
    fn create(
        &self,
        provider: &crate::config::ProviderConfig,
        client: &crate::config::ClientConfig,
    ) -> Result<Box<dyn RemoteDirectory>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_from_result() {
        let found: LookupOutcome<u8> = Ok(1).into();
        assert!(matches!(found, LookupOutcome::Found(1)));

        let missing: LookupOutcome<u8> = Err(crate::Error::not_found("zone")).into();
        assert!(matches!(missing, LookupOutcome::NotFound(_)));

        let failed: LookupOutcome<u8> = Err(crate::Error::api(500, "boom")).into();
        assert!(matches!(failed, LookupOutcome::Failed(crate::Error::Api { .. })));
    }

    #[test]
    fn lookup_into_result() {
        assert_eq!(LookupOutcome::Found(3).map(|v| v * 2).into_result().unwrap(), 6);
        assert!(
            LookupOutcome::<u8>::NotFound("gone".into())
                .into_result()
                .unwrap_err()
                .is_not_found()
        );
    }
}

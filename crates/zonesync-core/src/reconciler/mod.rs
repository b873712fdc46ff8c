//! Record reconciler
//!
//! The Reconciler maps one desired record onto the provider's actual state:
//! - Create with conflict adoption
//! - Read with identifier-drift recovery
//! - Update in place
//! - Idempotent Delete
//! - Import of an existing record by identifier
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Caller     │─── DesiredRecord / tracked DnsRecord ───┐
//! └──────────────┘                                         │
//!                                                          ▼
//!                                                 ┌──────────────┐
//!                                                 │  Reconciler  │
//!                                                 └──────────────┘
//!                                                          │
//!                        ┌─────────────────────────────────┤
//!                        │                                 │
//!                        ▼                                 ▼
//!               ┌──────────────────┐             ┌──────────────────┐
//!               │ ZoneView         │             │ RemoteDirectory  │
//!               │ (identity, id)   │             │ (fetch, mutate)  │
//!               └──────────────────┘             └──────────────────┘
//! ```
//!
//! ## Zone
//!
//! The zone of every returned record is the caller's zone. The provider's
//! echo is never trusted for it.
//!
//! ## State
//!
//! The reconciler holds no mutable state. Each operation fetches what it
//! needs, decides, and returns. Callers persist the result.

mod outcome;

pub use outcome::{Applied, ApplyAction, Deleted, ReadOutcome, Warning};

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::ReconcilerConfig;
use crate::error::{Error, Result};
use crate::identity::Identified;
use crate::record::{DesiredRecord, DnsRecord, RecordId};
use crate::traits::{DeleteOutcome, LookupOutcome, RemoteDirectory};
use crate::zone_view::ZoneView;

/// Stateless record reconciler
///
/// Cheap to clone; clones share the remote directory.
#[derive(Clone)]
pub struct Reconciler {
    directory: Arc<dyn RemoteDirectory>,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a reconciler over `directory`
    pub fn new(directory: Arc<dyn RemoteDirectory>, config: ReconcilerConfig) -> Self {
        Self { directory, config }
    }

    /// Reconciler settings
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Make `desired` exist remotely
    ///
    /// An existing record with the same identity is adopted, and updated in
    /// place when its value or TTL differs. A create rejected as a conflict
    /// is followed by one more lookup; only if that finds nothing is the
    /// conflict surfaced.
    pub async fn create(&self, desired: &DesiredRecord) -> Result<Applied> {
        desired
            .validate()
            .map_err(|e| desired_error("create", desired, None, e))?;

        debug!(
            "Creating {} ({}) in zone {} via {}",
            desired.name,
            desired.record_type,
            desired.zone,
            self.directory.provider_name()
        );

        // Best effort: a failed lookup falls through to the create
        match self.directory.fetch_zone(&desired.zone).await {
            LookupOutcome::Found(zone) => {
                let view = ZoneView::new(&desired.zone, zone);
                if let Some(existing) = view.find_by_identity(desired) {
                    return self.take_over(desired, existing.clone()).await;
                }
            }
            LookupOutcome::NotFound(detail) => {
                debug!("Zone {} not listed before create: {}", desired.zone, detail);
            }
            LookupOutcome::Failed(e) => {
                warn!(
                    "Could not check zone {} for an existing {} ({}): {}. Creating anyway.",
                    desired.zone, desired.name, desired.record_type, e
                );
            }
        }

        match self.directory.create_record(desired).await {
            Ok(created) => {
                let record = confirm_id("create", desired, created)?.in_zone(&desired.zone);
                info!(
                    "Created {} ({}) in zone {} with ID {}",
                    record.name, record.record_type, record.zone, record.id
                );
                Ok(Applied {
                    record,
                    action: ApplyAction::Created,
                    warnings: Vec::new(),
                })
            }
            Err(Error::Conflict(message)) => {
                warn!(
                    "Create of {} ({}) in zone {} conflicted: {}. Looking for the existing record.",
                    desired.name, desired.record_type, desired.zone, message
                );

                match self.directory.fetch_zone(&desired.zone).await {
                    LookupOutcome::Found(zone) => {
                        let view = ZoneView::new(&desired.zone, zone);
                        if let Some(existing) = view.find_by_identity(desired) {
                            return self.take_over(desired, existing.clone()).await;
                        }
                        debug!("No record matching {} after conflict", desired.identity());
                    }
                    LookupOutcome::NotFound(detail) => {
                        debug!("Zone {} not found after conflict: {}", desired.zone, detail);
                    }
                    LookupOutcome::Failed(e) => {
                        warn!("Lookup after conflict failed: {}", e);
                    }
                }

                error!(
                    "Create of {} ({}) in zone {} failed: conflict without a matching record",
                    desired.name, desired.record_type, desired.zone
                );
                Err(desired_error("create", desired, None, Error::Conflict(message)))
            }
            Err(e) => {
                error!(
                    "Create of {} ({}) in zone {} failed: {}",
                    desired.name, desired.record_type, desired.zone, e
                );
                Err(desired_error("create", desired, None, e))
            }
        }
    }

    /// Adopt `existing` as the result of creating `desired`
    async fn take_over(&self, desired: &DesiredRecord, existing: DnsRecord) -> Result<Applied> {
        if !existing.id.is_valid() {
            let e = Error::InvalidIdentifier {
                id: existing.id,
                message: "an existing record matches but its ID cannot be used".to_string(),
            };
            error!("{}", e);
            return Err(desired_error("create", desired, Some(existing.id), e));
        }

        if existing.satisfies(desired) {
            warn!(
                "Adopted existing {} ({}) in zone {} with ID {}",
                existing.name, existing.record_type, desired.zone, existing.id
            );
            let warning = Warning::new(
                "Adopted Existing DNS Record",
                format!(
                    "A DNS record {} ({}) with value {} already existed in zone {} (ID: {}). It is now managed without changes.",
                    existing.name, existing.record_type, existing.value, desired.zone, existing.id
                ),
            );
            return Ok(Applied {
                record: existing.in_zone(&desired.zone),
                action: ApplyAction::Adopted,
                warnings: vec![warning],
            });
        }

        let mut target = desired.to_record(existing.id);
        if desired.ttl.is_none() {
            target.ttl = existing.ttl;
        }

        info!(
            "Updating existing {} ({}) in zone {} with ID {}: {} -> {}",
            existing.name, existing.record_type, desired.zone, existing.id, existing.value, target.value
        );

        let updated = self
            .directory
            .update_record(&target)
            .await
            .map_err(|e| desired_error("create", desired, Some(existing.id), e))?;
        let record = confirm_id("create", desired, updated)?.in_zone(&desired.zone);

        let warning = Warning::new(
            "Updated Existing DNS Record",
            format!(
                "A DNS record {} ({}) already existed in zone {} (ID: {}) with value {}. It was updated to {}.",
                existing.name, existing.record_type, desired.zone, existing.id, existing.value, record.value
            ),
        );
        warn!("{}", warning);

        Ok(Applied {
            record,
            action: ApplyAction::UpdatedExisting,
            warnings: vec![warning],
        })
    }

    /// Refresh a tracked record from the provider
    ///
    /// Looks the record up by identifier first and by identity second, so a
    /// record the provider renumbered is found again under its new
    /// identifier. Both lookups use a single zone fetch.
    pub async fn read(&self, tracked: &DnsRecord) -> Result<ReadOutcome> {
        if tracked.zone.trim().is_empty() {
            return Err(tracked_error(
                "read",
                tracked,
                Error::validation("tracked record has no zone"),
            ));
        }

        let view = match self.directory.fetch_zone(&tracked.zone).await {
            LookupOutcome::Found(zone) => ZoneView::new(&tracked.zone, zone),
            LookupOutcome::NotFound(detail) => {
                info!("Zone {} no longer exists: {}", tracked.zone, detail);
                return Ok(ReadOutcome::Absent {
                    reason: format!("zone {} not found: {}", tracked.zone, detail),
                });
            }
            LookupOutcome::Failed(e) if self.config.drop_on_unconfirmed_read => {
                warn!(
                    "Could not fetch zone {} to read {} ({}): {}. Treating the record as gone.",
                    tracked.zone, tracked.name, tracked.record_type, e
                );
                return Ok(ReadOutcome::Absent {
                    reason: format!("zone {} could not be fetched: {}", tracked.zone, e),
                });
            }
            LookupOutcome::Failed(e) => {
                error!(
                    "Could not fetch zone {} to read {} ({}): {}",
                    tracked.zone, tracked.name, tracked.record_type, e
                );
                return Err(tracked_error("read", tracked, e));
            }
        };

        if tracked.id.is_valid() {
            if let Some(found) = view.find_by_id(tracked.id) {
                debug!("Found {} ({}) by ID {}", found.name, found.record_type, found.id);
                return Ok(ReadOutcome::Present {
                    record: found.clone(),
                    recovered_from: None,
                    warnings: Vec::new(),
                });
            }
            debug!(
                "ID {} not in zone {}, searching by name and type",
                tracked.id, tracked.zone
            );
        } else {
            debug!(
                "Tracked ID {} for {} ({}) is not usable, searching by name and type",
                tracked.id, tracked.name, tracked.record_type
            );
        }

        let Some(found) = view.find_by_identity(tracked) else {
            info!(
                "{} ({}) no longer exists in zone {}",
                tracked.name, tracked.record_type, tracked.zone
            );
            return Ok(ReadOutcome::Absent {
                reason: format!(
                    "no record {} ({}) in zone {}",
                    tracked.name, tracked.record_type, tracked.zone
                ),
            });
        };

        if !found.id.is_valid() {
            return Err(tracked_error(
                "read",
                tracked,
                Error::InvalidIdentifier {
                    id: found.id,
                    message: "the matching record's ID cannot be used".to_string(),
                },
            ));
        }

        let warning = Warning::new(
            "DNS Record ID Changed",
            format!(
                "The ID of {} ({}) in zone {} changed from {} to {}. Tracking the new ID.",
                found.name, found.record_type, tracked.zone, tracked.id, found.id
            ),
        );
        warn!("{}", warning);

        Ok(ReadOutcome::Present {
            record: found.clone(),
            recovered_from: Some(tracked.id),
            warnings: vec![warning],
        })
    }

    /// Apply `desired` to the tracked record in place
    pub async fn update(&self, tracked: &DnsRecord, desired: &DesiredRecord) -> Result<DnsRecord> {
        desired
            .validate()
            .map_err(|e| desired_error("update", desired, Some(tracked.id), e))?;

        if !tracked.id.is_valid() {
            return Err(desired_error(
                "update",
                desired,
                Some(tracked.id),
                Error::validation(format!("cannot update a record with invalid ID {}", tracked.id)),
            ));
        }

        let target = desired.to_record(tracked.id);
        let updated = self.directory.update_record(&target).await.map_err(|e| {
            error!(
                "Update of {} ({}) in zone {} failed: {}",
                desired.name, desired.record_type, desired.zone, e
            );
            desired_error("update", desired, Some(tracked.id), e)
        })?;
        let record = confirm_id("update", desired, updated)?.in_zone(&desired.zone);

        info!(
            "Updated {} ({}) in zone {} with ID {}",
            record.name, record.record_type, record.zone, record.id
        );
        Ok(record)
    }

    /// Remove the tracked record
    ///
    /// A record the provider says is already gone counts as deleted.
    pub async fn delete(&self, tracked: &DnsRecord) -> Result<Deleted> {
        if !tracked.id.is_valid() {
            return Err(tracked_error(
                "delete",
                tracked,
                Error::validation(format!("cannot delete a record with invalid ID {}", tracked.id)),
            ));
        }

        match self.directory.delete_record(&tracked.zone, tracked.id).await {
            Ok(DeleteOutcome::Deleted) => {
                info!(
                    "Deleted {} ({}) with ID {} from zone {}",
                    tracked.name, tracked.record_type, tracked.id, tracked.zone
                );
                Ok(Deleted::default())
            }
            Ok(DeleteOutcome::AlreadyAbsent(detail)) => {
                let warning = Warning::new(
                    "DNS Record Already Deleted",
                    format!(
                        "Record {} ({}) with ID {} was already absent from zone {}: {}",
                        tracked.name, tracked.record_type, tracked.id, tracked.zone, detail
                    ),
                );
                warn!("{}", warning);
                Ok(Deleted {
                    already_absent: true,
                    warnings: vec![warning],
                })
            }
            Err(e) => {
                error!(
                    "Delete of {} ({}) with ID {} from zone {} failed: {}",
                    tracked.name, tracked.record_type, tracked.id, tracked.zone, e
                );
                Err(tracked_error("delete", tracked, e))
            }
        }
    }

    /// Build a tracked record from a zone and an identifier
    ///
    /// There is no name or type to recover by, so a missing identifier is a
    /// [`Error::NotFound`].
    pub async fn import(&self, zone: &str, id: &str) -> Result<DnsRecord> {
        if zone.trim().is_empty() {
            return Err(Error::validation("import requires a zone"));
        }

        let id: RecordId = id.parse()?;
        if !id.is_valid() {
            return Err(Error::validation(format!(
                "cannot import record with invalid ID {}",
                id
            )));
        }

        let view = ZoneView::new(zone, self.directory.fetch_zone(zone).await.into_result()?);
        match view.find_by_id(id) {
            Some(record) => {
                info!(
                    "Imported {} ({}) with ID {} from zone {}",
                    record.name, record.record_type, record.id, zone
                );
                Ok(record.clone())
            }
            None => Err(Error::not_found(format!(
                "no record with ID {} in zone {}",
                id, zone
            ))),
        }
    }

    /// List every record of `zone`, each stamped with `zone`
    pub async fn list_zone(&self, zone: &str) -> Result<Vec<DnsRecord>> {
        if zone.trim().is_empty() {
            return Err(Error::validation("zone cannot be empty"));
        }

        let snapshot = self.directory.fetch_zone(zone).await.into_result()?;
        let view = ZoneView::new(zone, snapshot);
        debug!("Zone {} holds {} records", zone, view.len());
        Ok(view.into_records())
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("directory", &self.directory.provider_name())
            .field("config", &self.config)
            .finish()
    }
}

/// Reject a provider answer that carries no usable identifier
fn confirm_id(operation: &'static str, desired: &DesiredRecord, record: DnsRecord) -> Result<DnsRecord> {
    if record.id.is_valid() {
        return Ok(record);
    }

    let e = Error::contract_violation(format!(
        "provider reported success but returned ID {}",
        record.id
    ));
    error!("{} of {}: {}", operation, desired.identity(), e);
    Err(desired_error(operation, desired, Some(record.id), e))
}

fn desired_error(
    operation: &'static str,
    desired: &DesiredRecord,
    id: Option<RecordId>,
    source: Error,
) -> Error {
    Error::Record {
        operation,
        zone: desired.zone.clone(),
        name: desired.name.clone(),
        record_type: desired.record_type.clone(),
        id,
        source: Box::new(source),
    }
}

fn tracked_error(operation: &'static str, tracked: &DnsRecord, source: Error) -> Error {
    Error::Record {
        operation,
        zone: tracked.zone.clone(),
        name: tracked.name.clone(),
        record_type: tracked.record_type.clone(),
        id: Some(tracked.id),
        source: Box::new(source),
    }
}

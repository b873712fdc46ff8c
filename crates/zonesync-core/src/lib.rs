// # zonesync-core
//
// Core library for reconciling DNS records against a provider API that
// cannot be fully trusted.
//
// ## Architecture Overview
//
// - **RemoteDirectory**: Trait for the provider API holding the zones
// - **Reconciler**: Create / Read / Update / Delete / Import of one record
// - **ZoneView**: Per-operation snapshot of a zone, searchable by identity and ID
// - **identity**: The one (name, type) comparison used everywhere
// - **classify**: Maps free-text provider errors to conflict / not-found
// - **StateStore**: Persistence of tracked records between invocations
// - **DirectoryRegistry**: Plugin-based registry for remote directories
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider implementations
// 2. **Stateless Reconciliation**: Every operation fetches fresh state and returns a result
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: Create adopts, Delete tolerates absence, Read recovers drift

pub mod classify;
pub mod config;
pub mod error;
pub mod identity;
pub mod reconciler;
pub mod record;
pub mod registry;
pub mod state;
pub mod traits;
pub mod zone_view;

// Re-export core types for convenience
pub use config::{ClientConfig, ProviderConfig, ReconcilerConfig, StateStoreConfig, ZonesyncConfig};
pub use error::{Error, Result};
pub use reconciler::{Applied, ApplyAction, Deleted, ReadOutcome, Reconciler, Warning};
pub use record::{DEFAULT_TTL, DesiredRecord, DnsRecord, DnsZone, RecordId};
pub use registry::DirectoryRegistry;
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{DeleteOutcome, LookupOutcome, RemoteDirectory, StateStore, TrackedRecord};
pub use zone_view::ZoneView;

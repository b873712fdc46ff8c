//! Core traits for zonesync
//!
//! This module defines the abstract interfaces that implementations must follow.
//!
//! - [`RemoteDirectory`]: Provider API holding the zones
//! - [`StateStore`]: Persistence of tracked records between invocations

pub mod remote_directory;
pub mod state_store;

pub use remote_directory::{DeleteOutcome, LookupOutcome, RemoteDirectory, RemoteDirectoryFactory};
pub use state_store::{StateStore, TrackedRecord};

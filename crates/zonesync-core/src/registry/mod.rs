//! Plugin-based directory registry
//!
//! The registry allows remote directory implementations to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonesync_core::registry::DirectoryRegistry;
//! use zonesync_core::config::{ClientConfig, ProviderConfig};
//!
//! // Create a registry
//! let registry = DirectoryRegistry::new();
//!
//! // Register providers
//! zonesync_provider_lws::register(&registry);
//!
//! // Create a directory from config
//! let config = ProviderConfig::Lws { ... };
//! let directory = registry.create_directory(&config, &ClientConfig::default())?;
//! ```
//!
//! ## Registration
//!
//! Implementations register themselves during initialization:
//!
//! ```rust,ignore
//! // In zonesync-provider-lws crate
//! pub fn register(registry: &DirectoryRegistry) {
//!     registry.register_directory("lws", Box::new(LwsFactory));
//! }
//! ```

use crate::config::{ClientConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::traits::{RemoteDirectory, RemoteDirectoryFactory};
use std::collections::HashMap;
use std::sync::RwLock;

/// Registry of remote directory factories
///
/// Maps provider type names to factory objects, allowing dynamic
/// instantiation of directories based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct DirectoryRegistry {
    directories: RwLock<HashMap<String, Box<dyn RemoteDirectoryFactory>>>,
}

impl DirectoryRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a remote directory factory
    ///
    /// Registering the same name twice replaces the earlier factory.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use zonesync_core::registry::DirectoryRegistry;
    /// # use zonesync_core::traits::{RemoteDirectory, RemoteDirectoryFactory};
    /// # use zonesync_core::config::{ClientConfig, ProviderConfig};
    /// # struct MyFactory;
    /// # impl RemoteDirectoryFactory for MyFactory {
    /// #     fn create(&self, _: &ProviderConfig, _: &ClientConfig) -> zonesync_core::Result<Box<dyn RemoteDirectory>> { unimplemented!() }
    /// # }
    /// let registry = DirectoryRegistry::new();
    /// registry.register_directory("myprovider", Box::new(MyFactory));
    /// ```
    pub fn register_directory(
        &self,
        name: impl Into<String>,
        factory: Box<dyn RemoteDirectoryFactory>,
    ) {
        let name = name.into();
        let mut directories = self
            .directories
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        directories.insert(name, factory);
    }

    /// Create a remote directory from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RemoteDirectory>)`: Created directory
    /// - `Err(Error)`: If the provider type is not registered, the
    ///   configuration is invalid or creation fails
    pub fn create_directory(
        &self,
        provider: &ProviderConfig,
        client: &ClientConfig,
    ) -> Result<Box<dyn RemoteDirectory>> {
        provider.validate()?;
        client.validate()?;

        let provider_type = provider.type_name();
        let directories = self
            .directories
            .read()
            .map_err(|_| Error::Other("directory registry lock poisoned".to_string()))?;

        let factory = directories
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        tracing::debug!("Creating remote directory '{}'", provider_type);
        factory.create(provider, client)
    }

    /// List all registered provider types
    pub fn list_directories(&self) -> Vec<String> {
        let directories = self
            .directories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = directories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_directory(&self, name: &str) -> bool {
        let directories = self
            .directories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        directories.contains_key(name)
    }
}

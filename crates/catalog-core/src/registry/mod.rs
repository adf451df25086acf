//! Plugin-based component registry
//!
//! The registry lets external sources and record stores be registered at
//! runtime, so the daemon builds both from configuration without hardcoded
//! if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_core::registry::ComponentRegistry;
//! use catalog_core::config::{SourceConfig, StoreConfig};
//!
//! let registry = ComponentRegistry::with_builtin_stores();
//! catalog_source_swapi::register(&registry);
//!
//! let source = registry.create_source(&SourceConfig::default())?;
//! let store = registry.create_store(&StoreConfig::Memory).await?;
//! ```
//!
//! ## Registration
//!
//! Source crates register themselves during initialization:
//!
//! ```rust,ignore
//! pub fn register(registry: &ComponentRegistry) {
//!     registry.register_source("swapi", Box::new(SwapiFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::{SourceConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::store::{FileRecordStoreFactory, MemoryRecordStoreFactory};
use crate::traits::{ExternalSource, ExternalSourceFactory, RecordStore, RecordStoreFactory};

/// Registry mapping type names to source and store factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes. A poisoned lock is recovered rather than
/// propagated, since registrations are plain inserts.
#[derive(Default)]
pub struct ComponentRegistry {
    sources: RwLock<HashMap<String, Box<dyn ExternalSourceFactory>>>,
    stores: RwLock<HashMap<String, Arc<dyn RecordStoreFactory>>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` stores registered
    pub fn with_builtin_stores() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryRecordStoreFactory));
        registry.register_store("file", Box::new(FileRecordStoreFactory));
        registry
    }

    /// Register an external source factory under `name`
    pub fn register_source(&self, name: impl Into<String>, factory: Box<dyn ExternalSourceFactory>) {
        write(&self.sources).insert(name.into(), factory);
    }

    /// Register a record store factory under `name`
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn RecordStoreFactory>) {
        write(&self.stores).insert(name.into(), Arc::from(factory));
    }

    /// Create an external source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ExternalSource>)`: Created source instance
    /// - `Err(Error)`: If the source type is not registered or creation fails
    pub fn create_source(&self, config: &SourceConfig) -> Result<Box<dyn ExternalSource>> {
        let source_type = config.type_name();
        let sources = read(&self.sources);

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown source type: {}", source_type)))?;

        factory.create(config)
    }

    /// Create a record store from configuration
    pub async fn create_store(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
        let store_type = config.type_name();

        // Release the lock before calling async create
        let factory = read(&self.stores)
            .get(store_type)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown store type: {}", store_type)))?;

        factory.create(config).await
    }

    /// List all registered source types
    pub fn list_sources(&self) -> Vec<String> {
        read(&self.sources).keys().cloned().collect()
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        read(&self.stores).keys().cloned().collect()
    }

    pub fn has_source(&self, name: &str) -> bool {
        read(&self.sources).contains_key(name)
    }

    pub fn has_store(&self, name: &str) -> bool {
        read(&self.stores).contains_key(name)
    }
}

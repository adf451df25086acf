// # catalog-core
//
// Core library for the catalog synchronization system.
//
// ## Architecture Overview
//
// This library keeps a locally-editable film catalog in step with a read-only
// external feed without ever discarding local edits:
// - **ExternalSource**: Trait for fetching the upstream collection or a single item
// - **RecordStore**: Trait for persisting local records (lookup by id or external uid)
// - **policy**: Pure create/update/skip decision per incoming record
// - **SyncEngine**: Drives one sync pass and produces a `SyncReport`
// - **CatalogService**: Direct CRUD that flips the modified flag on external records
// - **ComponentRegistry**: Plugin-based registry for sources and stores
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Transport and storage live behind traits
// 2. **Local edits win**: A modified external record is never overwritten by sync
// 3. **Failure isolation**: One bad item never aborts the rest of a sync pass
// 4. **Library-First**: The daemon is a thin layer over this crate

pub mod traits;
pub mod model;
pub mod policy;
pub mod validation;
pub mod engine;
pub mod service;
pub mod registry;
pub mod config;
pub mod error;
pub mod store;

// Re-export core types for convenience
pub use traits::{ExternalSource, RecordStore};
pub use model::{ExternalRecord, FilmContent, FilmDraft, FilmUpdate, Record, RecordSource};
pub use policy::{SyncDecision, decide};
pub use engine::{SyncEngine, SyncEvent, SyncReport};
pub use service::CatalogService;
pub use registry::ComponentRegistry;
pub use config::{CatalogConfig, SourceConfig, StoreConfig, SyncConfig};
pub use error::{Error, Result};
pub use store::{FileRecordStore, MemoryRecordStore};

// # Record Store Trait
//
// Defines the interface for persisting local catalog records.
//
// ## Purpose
//
// The store is the single logical collection both the sync pass and direct
// CRUD write to. It owns:
// - Primary key generation
// - `uid` uniqueness among records that carry one
// - `createdAt` / `updatedAt` bookkeeping
//
// ## Implementations
//
// - In-memory: `MemoryRecordStore`
// - JSON file: `FileRecordStore`
//
// ## Usage
//
// ```rust,ignore
// use catalog_core::RecordStore;
// use catalog_core::model::{NewRecord, RecordPatch};
//
// let record = store.create(NewRecord::local(None, content)).await?;
// let updated = store.update(&record.id, &RecordPatch::default().modified()).await?;
// ```

use async_trait::async_trait;

use crate::model::{NewRecord, Record, RecordPatch};

/// Trait for record store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Uniqueness
///
/// `create` and `update` must reject a write that would give two records the
/// same `uid` with `Error::DuplicateKey`. Two sync passes racing on the same
/// upstream film rely on this to keep the catalog consistent.
///
/// # Transactions
///
/// Every call touches a single record. Nothing spans multiple records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the record carrying the given external uid
    async fn find_by_external_id(&self, uid: &str) -> Result<Option<Record>, crate::Error>;

    /// Find a record by its store-local id
    async fn find_by_id(&self, id: &str) -> Result<Option<Record>, crate::Error>;

    /// Persist a new record and return it with its generated id
    async fn create(&self, record: NewRecord) -> Result<Record, crate::Error>;

    /// Merge a partial update into a record
    ///
    /// List fields in the patch replace the stored lists.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Record))`: The post-update record
    /// - `Ok(None)`: No record with this id
    /// - `Err(Error)`: Storage or uniqueness error
    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<Option<Record>, crate::Error>;

    /// Delete a record, returning what was removed
    async fn delete(&self, id: &str) -> Result<Option<Record>, crate::Error>;

    /// List every record in creation order
    async fn list_all(&self) -> Result<Vec<Record>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing record stores from configuration
#[async_trait]
pub trait RecordStoreFactory: Send + Sync {
    /// Create a RecordStore instance from configuration
    async fn create(
        &self,
        config: &crate::config::StoreConfig,
    ) -> Result<Box<dyn RecordStore>, crate::Error>;
}

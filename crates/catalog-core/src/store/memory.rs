// # Memory Record Store
//
// In-memory implementation of RecordStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing and for demo deployments where the catalog is rebuilt
// by a sync pass after every start.
//
// ## Crash Behavior
//
// - All records are lost on restart/crash
// - Local edits do not survive a restart, so the next sync recreates every film
//   as an unmodified external record

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{apply_patch, ensure_unique_uid};
use crate::Error;
use crate::config::StoreConfig;
use crate::model::{NewRecord, Record, RecordPatch};
use crate::traits::{RecordStore, RecordStoreFactory};

/// In-memory record store implementation
///
/// Records live in a Vec protected by a RwLock, kept in creation order.
/// Cloning the store shares the same underlying records.
///
/// # Example
///
/// ```rust,no_run
/// use catalog_core::{FilmContent, MemoryRecordStore, RecordStore};
/// use catalog_core::model::NewRecord;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///
///     let record = store.create(NewRecord::local(None, FilmContent::default())).await?;
///     let found = store.find_by_id(&record.id).await?;
///     assert!(found.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<Vec<Record>>>,
}

impl MemoryRecordStore {
    /// Create a new empty memory record store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_by_external_id(&self, uid: &str) -> Result<Option<Record>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.iter().find(|r| r.uid.as_deref() == Some(uid)).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Record>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, record: NewRecord) -> Result<Record, Error> {
        let mut guard = self.inner.write().await;
        if let Some(uid) = &record.uid {
            ensure_unique_uid(&guard, uid, None)?;
        }

        let record = Record::from_new(record, Utc::now());
        guard.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<Option<Record>, Error> {
        let mut guard = self.inner.write().await;
        apply_patch(&mut guard, id, patch)
    }

    async fn delete(&self, id: &str) -> Result<Option<Record>, Error> {
        let mut guard = self.inner.write().await;
        let removed = guard
            .iter()
            .position(|r| r.id == id)
            .map(|index| guard.remove(index));
        Ok(removed)
    }

    async fn list_all(&self) -> Result<Vec<Record>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// Factory for `StoreConfig::Memory`
pub struct MemoryRecordStoreFactory;

#[async_trait]
impl RecordStoreFactory for MemoryRecordStoreFactory {
    async fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>, Error> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemoryRecordStore::new())),
            other => Err(Error::config(format!(
                "Memory store factory cannot build a '{}' store",
                other.type_name()
            ))),
        }
    }
}

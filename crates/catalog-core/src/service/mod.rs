//! Direct CRUD over the local catalog
//!
//! The service is the only writer besides the sync engine. Its one rule:
//! editing a record that came from the external feed marks it modified, which
//! protects it from every later sync overwrite. There is no way to undo that.

use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::model::{FilmDraft, FilmUpdate, NewRecord, Record, RecordPatch, RecordSource};
use crate::traits::RecordStore;
use crate::validation;

/// CRUD operations on catalog records
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn RecordStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create a local record
    ///
    /// The result always has `source = local` and is never marked modified.
    /// Missing required fields are reported together and nothing is written.
    pub async fn create(&self, draft: FilmDraft) -> Result<Record> {
        let uid = draft.uid.clone();
        let content = draft.into_content()?;

        let record = self.store.create(NewRecord::local(uid, content)).await?;
        info!("Created local record {}", record.id);
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Record>> {
        self.store.find_by_id(id).await
    }

    pub async fn list(&self) -> Result<Vec<Record>> {
        self.store.list_all().await
    }

    /// Apply a partial update
    ///
    /// Returns `Ok(None)` when no record has this id. An external record is
    /// marked modified whatever the payload contains.
    pub async fn update(&self, id: &str, update: FilmUpdate) -> Result<Option<Record>> {
        let violations = validation::validate_update(&update);
        if !violations.is_empty() {
            return Err(Error::Validation(violations));
        }

        let Some(existing) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut patch = RecordPatch::from_update(update);
        if existing.source == RecordSource::External {
            patch = patch.modified();
        }

        let updated = self.store.update(id, &patch).await?;
        if let Some(record) = &updated {
            info!(
                "Updated record {} (source={}, modified={})",
                record.id, record.source, record.is_modified
            );
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<Option<Record>> {
        let removed = self.store.delete(id).await?;
        if removed.is_some() {
            info!("Deleted record {}", id);
        }
        Ok(removed)
    }
}

// # File Record Store
//
// File-based implementation of RecordStore with crash recovery.
//
// ## Purpose
//
// Keeps the catalog, including local edits and provenance flags, across
// daemon restarts. Losing this file means losing the record of which films
// were edited locally, so writes are made as safe as a single file allows.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good catalog
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "records": [
//     {
//       "id": "5f0c...",
//       "uid": "1",
//       "title": "A New Hope",
//       "source": "external",
//       "isModified": false,
//       "lastSyncDate": "2025-01-09T12:00:00Z",
//       ...
//     }
//   ]
// }
// ```

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::{apply_patch, ensure_unique_uid};
use crate::Error;
use crate::config::StoreConfig;
use crate::model::{NewRecord, Record, RecordPatch};
use crate::traits::{RecordStore, RecordStoreFactory};

/// Catalog file format version
const CATALOG_FILE_VERSION: &str = "1.0";

/// File-based record store with crash recovery
///
/// Every mutation rewrites the whole file before returning. A mutation whose
/// write fails leaves the in-memory catalog untouched.
///
/// # Example
///
/// ```rust,no_run
/// use catalog_core::{FileRecordStore, FilmContent, RecordStore};
/// use catalog_core::model::NewRecord;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileRecordStore::new("/var/lib/catalog/films.json").await?;
///     store.create(NewRecord::local(None, FilmContent::default())).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    records: Arc<RwLock<Vec<Record>>>,
}

/// Serializable catalog file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CatalogFileFormat {
    version: String,
    records: Vec<Record>,
}

impl FileRecordStore {
    /// Create or load a file record store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing catalog file
    /// 3. If it is corrupted, try to load from backup
    /// 4. If both fail, start with an empty catalog
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create catalog directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let records = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
        })
    }

    async fn load_with_recovery(path: &Path) -> Result<Vec<Record>, Error> {
        let err = match Self::load(path).await {
            Ok(records) => {
                tracing::debug!("Loaded catalog from file: {} records", records.len());
                return Ok(records);
            }
            Err(e @ Error::Json(_)) => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            "Catalog file appears corrupted: {}. Attempting recovery from backup.",
            err
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with empty catalog.");
            return Ok(Vec::new());
        }

        match Self::load(&backup_path).await {
            Ok(records) => {
                tracing::info!("Recovered catalog from backup: {} records", records.len());
                if let Err(restore_err) = fs::copy(&backup_path, path).await {
                    tracing::error!("Failed to restore catalog file from backup: {}", restore_err);
                }
                Ok(records)
            }
            Err(backup_err) => {
                tracing::error!(
                    "Backup also corrupted: {}. Starting with empty catalog.",
                    backup_err
                );
                Ok(Vec::new())
            }
        }
    }

    async fn load(path: &Path) -> Result<Vec<Record>, Error> {
        if !path.exists() {
            tracing::debug!("Catalog file does not exist: {}", path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::persistence(format!(
                "Failed to read catalog file {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: CatalogFileFormat = serde_json::from_str(&content)?;

        if file.version != CATALOG_FILE_VERSION {
            tracing::warn!(
                "Catalog file version mismatch: expected {}, got {}. Attempting to load anyway.",
                CATALOG_FILE_VERSION,
                file.version
            );
        }

        Ok(file.records)
    }

    /// Write `records` to disk atomically
    ///
    /// Callers hold the write lock, so writes never interleave.
    async fn write(&self, records: &[Record]) -> Result<(), Error> {
        let file = CatalogFileFormat {
            version: CATALOG_FILE_VERSION.to_string(),
            records: records.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::persistence(format!("Failed to serialize catalog: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.write_all(json.as_bytes()).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.flush().await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            if let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::persistence(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Catalog written to file: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Force immediate write to disk
    pub async fn sync(&self) -> Result<(), Error> {
        let guard = self.records.write().await;
        self.write(&guard).await
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn find_by_external_id(&self, uid: &str) -> Result<Option<Record>, Error> {
        let guard = self.records.read().await;
        Ok(guard.iter().find(|r| r.uid.as_deref() == Some(uid)).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Record>, Error> {
        let guard = self.records.read().await;
        Ok(guard.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, record: NewRecord) -> Result<Record, Error> {
        let mut guard = self.records.write().await;
        if let Some(uid) = &record.uid {
            ensure_unique_uid(&guard, uid, None)?;
        }

        let record = Record::from_new(record, Utc::now());
        let mut next = guard.clone();
        next.push(record.clone());

        self.write(&next).await?;
        *guard = next;
        Ok(record)
    }

    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<Option<Record>, Error> {
        let mut guard = self.records.write().await;
        let mut next = guard.clone();

        let updated = apply_patch(&mut next, id, patch)?;
        if updated.is_some() {
            self.write(&next).await?;
            *guard = next;
        }
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<Option<Record>, Error> {
        let mut guard = self.records.write().await;
        let Some(index) = guard.iter().position(|r| r.id == id) else {
            return Ok(None);
        };

        let mut next = guard.clone();
        let removed = next.remove(index);
        self.write(&next).await?;
        *guard = next;
        Ok(Some(removed))
    }

    async fn list_all(&self) -> Result<Vec<Record>, Error> {
        Ok(self.records.read().await.clone())
    }

    async fn flush(&self) -> Result<(), Error> {
        self.sync().await
    }
}

/// Factory for `StoreConfig::File`
pub struct FileRecordStoreFactory;

#[async_trait]
impl RecordStoreFactory for FileRecordStoreFactory {
    async fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>, Error> {
        match config {
            StoreConfig::File { path } => Ok(Box::new(FileRecordStore::new(path).await?)),
            other => Err(Error::config(format!(
                "File store factory cannot build a '{}' store",
                other.type_name()
            ))),
        }
    }
}

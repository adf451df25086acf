//! Core sync engine
//!
//! The SyncEngine is responsible for:
//! - Fetching the full collection from the ExternalSource
//! - Looking up each incoming film in the RecordStore by external uid
//! - Applying the conflict policy (create, update or skip)
//! - Recording per-item outcomes in a SyncReport
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐
//! │ ExternalSource │─── Vec<ExternalRecord> ───┐
//! └────────────────┘                           │
//!                                              ▼
//!                                     ┌──────────────┐
//!                                     │  SyncEngine  │
//!                                     └──────────────┘
//!                                              │
//!         ┌────────────────────────────────────┼──────────────────────────┐
//!         │                                    │                          │
//!         ▼                                    ▼                          ▼
//! ┌──────────────┐                    ┌──────────────┐           ┌─────────────┐
//! │   policy     │                    │ RecordStore  │           │   Events    │
//! │  (decide)    │                    │ (write)      │           │  (notify)   │
//! └──────────────┘                    └──────────────┘           └─────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Fetch the collection; a failure aborts the pass with `Error::SyncAborted`
//! 2. For each film, in feed order, look up the local record by uid
//! 3. Create, update or skip according to `policy::decide`
//! 4. Count the outcome; a failing item never stops the pass
//! 5. Emit events for monitoring/logging

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::model::{ExternalRecord, NewRecord, Record, RecordPatch};
use crate::policy::{self, SyncDecision};
use crate::traits::{ExternalSource, RecordStore};

/// Message carried by every completed report
pub const SYNC_COMPLETED_MESSAGE: &str = "Sincronización completada";

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Collection fetched, pass starting
    Started { total: usize },

    /// A new external record was persisted
    RecordCreated { uid: String, id: String },

    /// An unmodified record was refreshed from the feed
    RecordUpdated { uid: String, id: String },

    /// A locally modified record was left alone
    RecordSkipped { uid: String, reason: String },

    /// Persisting a single film failed
    RecordFailed { uid: String, error: String },

    /// Pass finished
    Finished { success: usize, failed: usize },

    /// Pass aborted before any film was processed
    Aborted { error: String },
}

/// Outcome of one sync pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub message: String,

    /// Number of films the feed returned
    pub total: usize,

    /// Films created or updated
    pub success: usize,

    /// Films whose lookup or write failed
    pub failed: usize,

    /// One entry per failed or skipped film, in processing order
    pub errors: Vec<String>,
}

impl SyncReport {
    fn new(total: usize) -> Self {
        Self {
            message: SYNC_COMPLETED_MESSAGE.to_string(),
            total,
            success: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    /// Films skipped because they were modified locally
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.success + self.failed)
    }
}

enum ItemOutcome {
    Created(Record),
    Updated(Record),
    Skipped(String),
}

/// Core sync engine
///
/// One call to [`SyncEngine::run_sync`] is one pass over the external feed.
/// The engine holds no state between passes, so concurrent passes are
/// allowed; the store's uid uniqueness keeps them from duplicating films.
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Call [`SyncEngine::run_sync()`] whenever a pass is requested
/// 3. Drain the returned event receiver for monitoring
pub struct SyncEngine {
    /// Read-only upstream feed
    source: Arc<dyn ExternalSource>,

    /// Local catalog
    store: Arc<dyn RecordStore>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields sync events
    pub fn new(
        source: Arc<dyn ExternalSource>,
        store: Arc<dyn RecordStore>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            source,
            store,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run one sync pass
    ///
    /// # Returns
    ///
    /// - `Ok(SyncReport)`: The pass ran over every fetched film
    /// - `Err(Error::SyncAborted)`: The collection could not be fetched; nothing was written
    pub async fn run_sync(&self) -> Result<SyncReport> {
        let films = match self.source.fetch_collection().await {
            Ok(films) => films,
            Err(e) => {
                error!(
                    "Sync aborted, {} feed unavailable: {}",
                    self.source.source_name(),
                    e
                );
                self.emit_event(SyncEvent::Aborted {
                    error: e.to_string(),
                });
                return Err(Error::sync_aborted(e));
            }
        };

        info!(
            "Sync started: {} films from {}",
            films.len(),
            self.source.source_name()
        );
        self.emit_event(SyncEvent::Started { total: films.len() });

        let mut report = SyncReport::new(films.len());

        for film in &films {
            match self.sync_one(film).await {
                Ok(ItemOutcome::Created(record)) => {
                    report.success += 1;
                    self.emit_event(SyncEvent::RecordCreated {
                        uid: film.uid.clone(),
                        id: record.id,
                    });
                }
                Ok(ItemOutcome::Updated(record)) => {
                    report.success += 1;
                    self.emit_event(SyncEvent::RecordUpdated {
                        uid: film.uid.clone(),
                        id: record.id,
                    });
                }
                Ok(ItemOutcome::Skipped(reason)) => {
                    debug!("{}", reason);
                    report.errors.push(reason.clone());
                    self.emit_event(SyncEvent::RecordSkipped {
                        uid: film.uid.clone(),
                        reason,
                    });
                }
                Err(e) => {
                    warn!("Failed to sync film {}: {}", film.uid, e);
                    report.failed += 1;
                    report
                        .errors
                        .push(format!("Error con película {}: {}", film.uid, e));
                    self.emit_event(SyncEvent::RecordFailed {
                        uid: film.uid.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Sync finished: total={} success={} failed={} skipped={}",
            report.total,
            report.success,
            report.failed,
            report.skipped()
        );
        self.emit_event(SyncEvent::Finished {
            success: report.success,
            failed: report.failed,
        });

        Ok(report)
    }

    /// Process a single incoming film
    async fn sync_one(&self, film: &ExternalRecord) -> Result<ItemOutcome> {
        let existing = self.store.find_by_external_id(&film.uid).await?;

        match policy::decide(existing.as_ref(), film) {
            SyncDecision::Create => {
                let content = film.to_draft().into_content()?;
                let record = self
                    .store
                    .create(NewRecord::external(film.uid.clone(), content, Utc::now()))
                    .await?;
                debug!("Created record {} for film {}", record.id, film.uid);
                Ok(ItemOutcome::Created(record))
            }
            SyncDecision::Update { id } => {
                let content = film.to_draft().into_content()?;
                let patch = RecordPatch::from_content(content).synced_at(Utc::now());
                let record = self.store.update(&id, &patch).await?.ok_or_else(|| {
                    Error::not_found(format!("record {} disappeared during sync", id))
                })?;
                debug!("Updated record {} for film {}", record.id, film.uid);
                Ok(ItemOutcome::Updated(record))
            }
            SyncDecision::Skip { reason } => Ok(ItemOutcome::Skipped(reason)),
        }
    }

    /// Emit a sync event
    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!(
                "Event channel full, dropping event. Consider increasing event_channel_capacity."
            ),
            // Nobody is listening; events are optional
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

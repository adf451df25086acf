//! Test doubles and common utilities for catalog contract tests
//!
//! These doubles script the external feed and inject store failures so the
//! contract tests can pin down sync behavior without any network or disk.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_core::error::{Error, Result};
use catalog_core::model::{ExternalProperties, ExternalRecord, NewRecord, Record, RecordPatch};
use catalog_core::{ExternalSource, MemoryRecordStore, RecordStore, SyncConfig, SyncEngine, SyncEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Build a complete external film
pub fn film(uid: &str, title: &str) -> ExternalRecord {
    ExternalRecord {
        uid: uid.to_string(),
        description: Some("A Star Wars Film".to_string()),
        properties: ExternalProperties {
            title: Some(title.to_string()),
            episode_id: uid.parse().ok(),
            opening_crawl: Some("It is a period of civil war...".to_string()),
            director: Some("George Lucas".to_string()),
            producer: Some("Gary Kurtz, Rick McCallum".to_string()),
            release_date: Some("1977-05-25".to_string()),
            characters: vec!["https://swapi.tech/api/people/1".to_string()],
            url: Some(format!("https://swapi.tech/api/films/{}", uid)),
            ..ExternalProperties::default()
        },
    }
}

/// A source returning a scripted collection that tests can swap between passes
pub struct ScriptedSource {
    films: Arc<Mutex<Vec<ExternalRecord>>>,
    fetch_count: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(films: Vec<ExternalRecord>) -> Self {
        Self {
            films: Arc::new(Mutex::new(films)),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the collection returned by later fetches
    pub fn set_films(&self, films: Vec<ExternalRecord>) {
        *self.films.lock().unwrap() = films;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Create a ScriptedSource sharing collection and counters with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            films: Arc::clone(&other.films),
            fetch_count: Arc::clone(&other.fetch_count),
        }
    }
}

#[async_trait]
impl ExternalSource for ScriptedSource {
    async fn fetch_collection(&self) -> Result<Vec<ExternalRecord>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.films.lock().unwrap().clone())
    }

    async fn fetch_one(&self, external_id: &str) -> Result<ExternalRecord> {
        self.films
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.uid == external_id)
            .cloned()
            .ok_or_else(|| Error::source_unavailable(format!("no film {}", external_id)))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A source whose feed is always down
pub struct UnavailableSource;

#[async_trait]
impl ExternalSource for UnavailableSource {
    async fn fetch_collection(&self) -> Result<Vec<ExternalRecord>> {
        Err(Error::source_unavailable("connection refused"))
    }

    async fn fetch_one(&self, _external_id: &str) -> Result<ExternalRecord> {
        Err(Error::source_unavailable("connection refused"))
    }

    fn source_name(&self) -> &'static str {
        "unavailable"
    }
}

/// A store wrapper that fails the Nth create or update (1-based) and counts writes
pub struct FlakyStore {
    inner: MemoryRecordStore,
    fail_on_create: Option<usize>,
    fail_on_update: Option<usize>,
    vanish_on_update: Option<usize>,
    create_count: Arc<AtomicUsize>,
    update_count: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new(inner: MemoryRecordStore) -> Self {
        Self {
            inner,
            fail_on_create: None,
            fail_on_update: None,
            vanish_on_update: None,
            create_count: Arc::new(AtomicUsize::new(0)),
            update_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_create(mut self, nth: usize) -> Self {
        self.fail_on_create = Some(nth);
        self
    }

    pub fn failing_update(mut self, nth: usize) -> Self {
        self.fail_on_update = Some(nth);
        self
    }

    /// Delete the target record just before the Nth update, as a concurrent CRUD delete would
    pub fn vanishing_update(mut self, nth: usize) -> Self {
        self.vanish_on_update = Some(nth);
        self
    }

    pub fn create_count(&self) -> usize {
        self.create_count.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.update_count.load(Ordering::SeqCst)
    }

    /// Create a FlakyStore sharing records and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            inner: other.inner.clone(),
            fail_on_create: other.fail_on_create,
            fail_on_update: other.fail_on_update,
            vanish_on_update: other.vanish_on_update,
            create_count: Arc::clone(&other.create_count),
            update_count: Arc::clone(&other.update_count),
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn find_by_external_id(&self, uid: &str) -> Result<Option<Record>> {
        self.inner.find_by_external_id(uid).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Record>> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, record: NewRecord) -> Result<Record> {
        let n = self.create_count.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_create == Some(n) {
            return Err(Error::persistence("disk full"));
        }
        self.inner.create(record).await
    }

    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<Option<Record>> {
        let n = self.update_count.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_update == Some(n) {
            return Err(Error::persistence("io"));
        }
        if self.vanish_on_update == Some(n) {
            self.inner.delete(id).await?;
        }
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<Option<Record>> {
        self.inner.delete(id).await
    }

    async fn list_all(&self) -> Result<Vec<Record>> {
        self.inner.list_all().await
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }
}

/// A store whose uid lookup never sees existing records
///
/// Simulates the read half of two passes racing on the same film: both see
/// nothing and both try to create.
pub struct StaleLookupStore {
    inner: MemoryRecordStore,
}

impl StaleLookupStore {
    pub fn new(inner: MemoryRecordStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RecordStore for StaleLookupStore {
    async fn find_by_external_id(&self, _uid: &str) -> Result<Option<Record>> {
        Ok(None)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Record>> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, record: NewRecord) -> Result<Record> {
        self.inner.create(record).await
    }

    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<Option<Record>> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<Option<Record>> {
        self.inner.delete(id).await
    }

    async fn list_all(&self) -> Result<Vec<Record>> {
        self.inner.list_all().await
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Helper to build an engine with a small event channel
pub fn engine(
    source: impl ExternalSource + 'static,
    store: impl RecordStore + 'static,
) -> (SyncEngine, mpsc::Receiver<SyncEvent>) {
    let config = SyncConfig {
        event_channel_capacity: 100,
    };
    SyncEngine::new(Arc::new(source), Arc::new(store), config).expect("engine construction succeeds")
}

/// Collect every event currently buffered in the channel
pub fn drain(rx: &mut mpsc::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

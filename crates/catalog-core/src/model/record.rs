// # Catalog Records
//
// The persisted entity and the payload types that create or mutate it.
//
// ## Provenance
//
// Every record carries three provenance fields next to its content:
// - `source`: who created it (`external` feed or `local` CRUD), fixed at creation
// - `is_modified`: raised the first time an external record is edited locally, never lowered
// - `last_sync_date`: stamped each time a sync pass writes the record
//
// Content fields are opaque to the sync logic; they are copied wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation;

/// Where a record originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Created by a sync pass from the external feed
    #[serde(alias = "api")]
    External,
    /// Created through direct CRUD
    Local,
}

impl RecordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::External => "external",
            RecordSource::Local => "local",
        }
    }
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain attributes of a film
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmContent {
    pub title: String,
    pub episode_id: i64,
    pub opening_crawl: String,
    pub director: String,
    pub producer: String,
    pub release_date: String,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub planets: Vec<String>,
    #[serde(default)]
    pub starships: Vec<String>,
    #[serde(default)]
    pub vehicles: Vec<String>,
    #[serde(default)]
    pub species: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A persisted catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Store-local primary key
    pub id: String,

    /// External unique id (unique among records that have one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    #[serde(flatten)]
    pub content: FilmContent,

    pub source: RecordSource,

    #[serde(rename = "isModified", default)]
    pub is_modified: bool,

    #[serde(
        rename = "lastSyncDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_sync_date: Option<DateTime<Utc>>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Materialize a new record with a freshly generated id
    ///
    /// Only `RecordStore` implementations call this; everything else goes
    /// through `RecordStore::create`.
    pub fn from_new(new: NewRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            uid: new.uid,
            content: new.content,
            source: new.source,
            is_modified: false,
            last_sync_date: new.last_sync_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a patch into this record
    ///
    /// Scalar fields are overwritten when present, list fields are replaced
    /// wholesale, and the modified flag can only be raised.
    pub fn apply(&mut self, patch: &RecordPatch, now: DateTime<Utc>) {
        if let Some(uid) = &patch.uid {
            self.uid = Some(uid.clone());
        }

        let content = &mut self.content;
        if let Some(v) = &patch.title {
            content.title = v.clone();
        }
        if let Some(v) = patch.episode_id {
            content.episode_id = v;
        }
        if let Some(v) = &patch.opening_crawl {
            content.opening_crawl = v.clone();
        }
        if let Some(v) = &patch.director {
            content.director = v.clone();
        }
        if let Some(v) = &patch.producer {
            content.producer = v.clone();
        }
        if let Some(v) = &patch.release_date {
            content.release_date = v.clone();
        }
        if let Some(v) = &patch.characters {
            content.characters = v.clone();
        }
        if let Some(v) = &patch.planets {
            content.planets = v.clone();
        }
        if let Some(v) = &patch.starships {
            content.starships = v.clone();
        }
        if let Some(v) = &patch.vehicles {
            content.vehicles = v.clone();
        }
        if let Some(v) = &patch.species {
            content.species = v.clone();
        }
        if let Some(v) = &patch.url {
            content.url = Some(v.clone());
        }
        if let Some(v) = &patch.description {
            content.description = Some(v.clone());
        }

        if patch.mark_modified {
            self.is_modified = true;
        }
        if let Some(at) = patch.last_sync_date {
            self.last_sync_date = Some(at);
        }

        self.updated_at = now;
    }
}

/// Input to `RecordStore::create`
///
/// Carries no `is_modified`: every record starts unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub uid: Option<String>,
    pub content: FilmContent,
    pub source: RecordSource,
    pub last_sync_date: Option<DateTime<Utc>>,
}

impl NewRecord {
    /// A record created by direct CRUD
    pub fn local(uid: Option<String>, content: FilmContent) -> Self {
        Self {
            uid,
            content,
            source: RecordSource::Local,
            last_sync_date: None,
        }
    }

    /// A record created by a sync pass
    pub fn external(uid: impl Into<String>, content: FilmContent, synced_at: DateTime<Utc>) -> Self {
        Self {
            uid: Some(uid.into()),
            content,
            source: RecordSource::External,
            last_sync_date: Some(synced_at),
        }
    }
}

/// Partial update applied by `RecordStore::update`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub uid: Option<String>,
    pub title: Option<String>,
    pub episode_id: Option<i64>,
    pub opening_crawl: Option<String>,
    pub director: Option<String>,
    pub producer: Option<String>,
    pub release_date: Option<String>,
    pub characters: Option<Vec<String>>,
    pub planets: Option<Vec<String>>,
    pub starships: Option<Vec<String>>,
    pub vehicles: Option<Vec<String>>,
    pub species: Option<Vec<String>>,
    pub url: Option<String>,
    pub description: Option<String>,
    /// Raise `is_modified`; there is no way to lower it
    pub mark_modified: bool,
    pub last_sync_date: Option<DateTime<Utc>>,
}

impl RecordPatch {
    /// Patch overwriting every content field, as a sync update does
    pub fn from_content(content: FilmContent) -> Self {
        Self {
            title: Some(content.title),
            episode_id: Some(content.episode_id),
            opening_crawl: Some(content.opening_crawl),
            director: Some(content.director),
            producer: Some(content.producer),
            release_date: Some(content.release_date),
            characters: Some(content.characters),
            planets: Some(content.planets),
            starships: Some(content.starships),
            vehicles: Some(content.vehicles),
            species: Some(content.species),
            url: content.url,
            description: content.description,
            ..Self::default()
        }
    }

    /// Patch carrying exactly the fields of a CRUD update payload
    pub fn from_update(update: FilmUpdate) -> Self {
        Self {
            uid: update.uid,
            title: update.title,
            episode_id: update.episode_id,
            opening_crawl: update.opening_crawl,
            director: update.director,
            producer: update.producer,
            release_date: update.release_date,
            characters: update.characters,
            planets: update.planets,
            starships: update.starships,
            vehicles: update.vehicles,
            species: update.species,
            url: update.url,
            description: update.description,
            ..Self::default()
        }
    }

    /// Stamp the sync date
    pub fn synced_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_sync_date = Some(at);
        self
    }

    /// Raise the modified flag
    pub fn modified(mut self) -> Self {
        self.mark_modified = true;
        self
    }
}

/// CRUD create payload
///
/// Every field is optional at the type level so that missing fields are
/// reported together by [`validation::validate_draft`] instead of failing
/// on the first one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilmDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub episode_id: Option<i64>,
    #[serde(default)]
    pub opening_crawl: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub producer: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub characters: Option<Vec<String>>,
    #[serde(default)]
    pub planets: Option<Vec<String>>,
    #[serde(default)]
    pub starships: Option<Vec<String>>,
    #[serde(default)]
    pub vehicles: Option<Vec<String>>,
    #[serde(default)]
    pub species: Option<Vec<String>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
}

impl FilmDraft {
    /// Validate and convert into content, reporting every violation at once
    pub fn into_content(self) -> Result<FilmContent> {
        let violations = validation::validate_draft(&self);
        if !violations.is_empty() {
            return Err(Error::Validation(violations));
        }

        Ok(FilmContent {
            title: self.title.unwrap_or_default(),
            episode_id: self.episode_id.unwrap_or_default(),
            opening_crawl: self.opening_crawl.unwrap_or_default(),
            director: self.director.unwrap_or_default(),
            producer: self.producer.unwrap_or_default(),
            release_date: self.release_date.unwrap_or_default(),
            characters: self.characters.unwrap_or_default(),
            planets: self.planets.unwrap_or_default(),
            starships: self.starships.unwrap_or_default(),
            vehicles: self.vehicles.unwrap_or_default(),
            species: self.species.unwrap_or_default(),
            url: self.url,
            description: self.description,
        })
    }
}

/// CRUD update payload
///
/// Carries no provenance fields: callers cannot set `source`, `isModified`
/// or `lastSyncDate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilmUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub episode_id: Option<i64>,
    #[serde(default)]
    pub opening_crawl: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub producer: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub characters: Option<Vec<String>>,
    #[serde(default)]
    pub planets: Option<Vec<String>>,
    #[serde(default)]
    pub starships: Option<Vec<String>>,
    #[serde(default)]
    pub vehicles: Option<Vec<String>>,
    #[serde(default)]
    pub species: Option<Vec<String>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
}

// # External Records
//
// Canonical shape of a film as served by the upstream feed, plus the
// read-only views used by the passthrough endpoints.
//
// ## Wire Format
//
// ```json
// {
//   "uid": "1",
//   "description": "A Star Wars Film",
//   "properties": {
//     "title": "A New Hope",
//     "episode_id": 4,
//     "characters": ["https://swapi.tech/api/people/1"],
//     ...
//   }
// }
// ```
//
// Decoding is lenient: missing properties become `None` or empty lists, and
// required fields are enforced when a record is persisted, so one malformed
// film fails on its own instead of failing the whole feed.

use serde::{Deserialize, Serialize};

use super::record::FilmDraft;

/// A film as returned by the upstream feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalRecord {
    /// Upstream unique id
    pub uid: String,

    #[serde(default)]
    pub description: Option<String>,

    pub properties: ExternalProperties,
}

/// Property bag mirroring the film's domain attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalProperties {
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
    pub characters: Vec<String>,
    #[serde(default)]
    pub planets: Vec<String>,
    #[serde(default)]
    pub starships: Vec<String>,
    #[serde(default)]
    pub vehicles: Vec<String>,
    #[serde(default)]
    pub species: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Upstream creation timestamp (ISO 8601, informational)
    #[serde(default)]
    pub created: Option<String>,
    /// Upstream edit timestamp (ISO 8601, informational)
    #[serde(default)]
    pub edited: Option<String>,
}

impl ExternalRecord {
    /// Title as reported upstream, empty if missing
    pub fn title(&self) -> &str {
        self.properties.title.as_deref().unwrap_or_default()
    }

    /// Map the upstream shape onto the catalog's create payload
    pub fn to_draft(&self) -> FilmDraft {
        let p = &self.properties;
        FilmDraft {
            title: p.title.clone(),
            episode_id: p.episode_id,
            opening_crawl: p.opening_crawl.clone(),
            director: p.director.clone(),
            producer: p.producer.clone(),
            release_date: p.release_date.clone(),
            characters: Some(p.characters.clone()),
            planets: Some(p.planets.clone()),
            starships: Some(p.starships.clone()),
            vehicles: Some(p.vehicles.clone()),
            species: Some(p.species.clone()),
            url: p.url.clone(),
            description: self.description.clone(),
            uid: Some(self.uid.clone()),
        }
    }

    pub fn summary(&self) -> ExternalSummary {
        let p = &self.properties;
        ExternalSummary {
            uid: self.uid.clone(),
            title: p.title.clone(),
            director: p.director.clone(),
            producer: p.producer.clone(),
            opening_crawl: p.opening_crawl.clone(),
            episode_id: p.episode_id,
            release_date: p.release_date.clone(),
        }
    }

    pub fn detail(&self) -> ExternalDetail {
        ExternalDetail {
            properties: self.properties.clone(),
            description: self.description.clone(),
            uid: self.uid.clone(),
        }
    }
}

/// Short passthrough view of an external film
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalSummary {
    pub uid: String,
    pub title: Option<String>,
    pub director: Option<String>,
    pub producer: Option<String>,
    pub opening_crawl: Option<String>,
    pub episode_id: Option<i64>,
    pub release_date: Option<String>,
}

/// Full passthrough view: every property, flattened, plus description and uid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalDetail {
    #[serde(flatten)]
    pub properties: ExternalProperties,
    pub description: Option<String>,
    pub uid: String,
}

/// Either passthrough view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExternalView {
    Summary(ExternalSummary),
    Full(ExternalDetail),
}

/// Project a fetched collection into passthrough views
pub fn external_views(records: &[ExternalRecord], full: bool) -> Vec<ExternalView> {
    records
        .iter()
        .map(|record| {
            if full {
                ExternalView::Full(record.detail())
            } else {
                ExternalView::Summary(record.summary())
            }
        })
        .collect()
}

// # SWAPI Film Source
//
// This crate provides the SWAPI-backed ExternalSource for the catalog system.
//
// ## Behavior
//
// - One HTTP request per call, no retry, no backoff
// - No caching between calls
// - Every transport, status or decode failure becomes `Error::SourceUnavailable`
// - No timeout unless one is configured
// - Ids that are not plain tokens are rejected before any request is made
//
// Retrying a failed pass is the caller's decision: the sync engine aborts
// the pass and reports the failure.
//
// ## API Reference
//
// - List films: GET `{base_url}/films`
// - Get film: GET `{base_url}/films/:uid`
//
// Both wrap the payload in an envelope:
//
// ```json
// { "message": "ok", "result": [ { "uid": "1", "properties": { ... } } ] }
// ```

use async_trait::async_trait;
use catalog_core::config::SourceConfig;
use catalog_core::model::ExternalRecord;
use catalog_core::traits::{ExternalSource, ExternalSourceFactory};
use catalog_core::validation::FieldViolation;
use catalog_core::{ComponentRegistry, Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Response envelope shared by every SWAPI endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    message: Option<String>,
    result: T,
}

/// SWAPI film source
#[derive(Debug, Clone)]
pub struct SwapiSource {
    /// Base URL without trailing slash, e.g. `https://swapi.tech/api`
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl SwapiSource {
    /// Create a new SWAPI source
    ///
    /// # Parameters
    ///
    /// - `base_url`: Feed root; films are read from `{base_url}/films`
    /// - `timeout`: Optional per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` and decode the envelope's `result`
    async fn get<T>(&self, url: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::source_unavailable(format!("HTTP request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::source_unavailable(format!(
                "{} returned {}: {}",
                url, status, body
            )));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::source_unavailable(format!("Failed to decode response from {}: {}", url, e))
        })?;

        if let Some(message) = envelope.message.as_deref() {
            tracing::trace!("{} answered: {}", url, message);
        }
        Ok(envelope.result)
    }
}

#[async_trait]
impl ExternalSource for SwapiSource {
    async fn fetch_collection(&self) -> Result<Vec<ExternalRecord>> {
        let url = format!("{}/films", self.base_url);
        let films: Vec<ExternalRecord> = self.get(&url).await?;
        tracing::info!("Fetched {} films from {}", films.len(), url);
        Ok(films)
    }

    async fn fetch_one(&self, external_id: &str) -> Result<ExternalRecord> {
        if !is_plain_uid(external_id) {
            return Err(Error::Validation(vec![FieldViolation::new(
                "uid",
                "must contain only letters, digits, '-' or '_'",
            )]));
        }

        let url = format!("{}/films/{}", self.base_url, external_id);
        self.get(&url).await
    }

    fn source_name(&self) -> &'static str {
        "swapi"
    }
}

/// Upstream ids are spliced into the URL path, so only plain tokens are accepted
fn is_plain_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Factory for creating SWAPI sources
pub struct SwapiFactory;

impl ExternalSourceFactory for SwapiFactory {
    fn create(&self, config: &SourceConfig) -> Result<Box<dyn ExternalSource>> {
        match config {
            SourceConfig::Swapi {
                base_url,
                timeout_secs,
            } => {
                config.validate()?;
                let timeout = timeout_secs.map(Duration::from_secs);
                Ok(Box::new(SwapiSource::new(base_url.clone(), timeout)?))
            }
            _ => Err(Error::config("Invalid config for SWAPI source")),
        }
    }
}

/// Register the SWAPI source with a registry
///
/// # Example
///
/// ```rust
/// use catalog_core::ComponentRegistry;
///
/// let registry = ComponentRegistry::new();
/// catalog_source_swapi::register(&registry);
/// assert!(registry.has_source("swapi"));
/// ```
pub fn register(registry: &ComponentRegistry) {
    registry.register_source("swapi", Box::new(SwapiFactory));
}

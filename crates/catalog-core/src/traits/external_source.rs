// # External Source Trait
//
// Defines the interface for reading films from the authoritative upstream feed.
//
// ## Implementations
//
// - SWAPI over HTTP: `catalog-source-swapi` crate
//
// ## Usage
//
// ```rust,ignore
// use catalog_core::ExternalSource;
//
// #[tokio::main]
// async fn main() -> catalog_core::Result<()> {
//     let source = /* ExternalSource implementation */;
//
//     // Whole collection, in upstream order
//     let films = source.fetch_collection().await?;
//
//     // A single film by upstream uid
//     let film = source.fetch_one("1").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::ExternalRecord;

/// Trait for external source implementations
///
/// The feed is read-only: a source never writes upstream and never touches
/// the record store.
///
/// # Failure Semantics
///
/// Any transport, status or decode failure must surface as
/// `Error::SourceUnavailable`. Sources make exactly one attempt per call:
/// no retry loop, no backoff, no caching between calls.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait ExternalSource: Send + Sync {
    /// Fetch the full external collection
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ExternalRecord>)`: Every film, in the order the feed returned them
    /// - `Err(Error::SourceUnavailable)`: The feed could not be read
    async fn fetch_collection(&self) -> Result<Vec<ExternalRecord>, crate::Error>;

    /// Fetch a single external item by its upstream id
    ///
    /// Not used by the sync pass; exposed for passthrough lookups.
    async fn fetch_one(&self, external_id: &str) -> Result<ExternalRecord, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing external sources from configuration
pub trait ExternalSourceFactory: Send + Sync {
    /// Create an ExternalSource instance from configuration
    fn create(
        &self,
        config: &crate::config::SourceConfig,
    ) -> Result<Box<dyn ExternalSource>, crate::Error>;
}

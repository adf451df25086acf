//! Data model for the catalog
//!
//! - [`Record`]: the persisted catalog entity with its provenance fields
//! - [`ExternalRecord`]: a film as returned by the upstream feed
//! - [`FilmDraft`] / [`FilmUpdate`]: payloads accepted by direct CRUD

pub mod record;
pub mod external;

pub use record::{
    FilmContent, FilmDraft, FilmUpdate, NewRecord, Record, RecordPatch, RecordSource,
};
pub use external::{
    ExternalDetail, ExternalProperties, ExternalRecord, ExternalSummary, ExternalView,
    external_views,
};

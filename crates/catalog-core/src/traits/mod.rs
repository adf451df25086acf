//! Core traits for the catalog system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ExternalSource`]: Fetch films from the read-only upstream feed
//! - [`RecordStore`]: Persist local catalog records

pub mod external_source;
pub mod record_store;

pub use external_source::{ExternalSource, ExternalSourceFactory};
pub use record_store::{RecordStore, RecordStoreFactory};

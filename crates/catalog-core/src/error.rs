//! Error types for the catalog system
//!
//! This module defines all error types used throughout the crate.

use crate::validation::FieldViolation;
use thiserror::Error;

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the catalog system
#[derive(Error, Debug)]
pub enum Error {
    /// The external feed could not be fetched or decoded
    #[error("External source unavailable: {0}")]
    SourceUnavailable(String),

    /// A whole sync pass was aborted before any item was processed
    #[error("Sync aborted: {cause}")]
    SyncAborted {
        /// The failure that prevented the pass from starting
        #[source]
        cause: Box<Error>,
    },

    /// Record store read/write errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A write would duplicate an existing external uid
    #[error("Duplicate key: uid {0} already exists")]
    DuplicateKey(String),

    /// One or more fields are missing or malformed
    #[error("Validation failed: {}", format_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a source-unavailable error
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Wrap the failure that aborted a sync pass
    pub fn sync_aborted(cause: Error) -> Self {
        Self::SyncAborted {
            cause: Box::new(cause),
        }
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a duplicate-key error for the given uid
    pub fn duplicate_key(uid: impl Into<String>) -> Self {
        Self::DuplicateKey(uid.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Field violations carried by a validation error, empty otherwise
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Validation(violations) => violations,
            _ => &[],
        }
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

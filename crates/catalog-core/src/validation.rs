//! Field validation for catalog payloads
//!
//! Each entity has one explicit validation function that collects every
//! violated field instead of stopping at the first failure.

use serde::{Deserialize, Serialize};

use crate::model::{FilmDraft, FilmUpdate};

/// Fields a film must carry before it can be persisted
pub const REQUIRED_FIELDS: &[&str] = &[
    "title",
    "episode_id",
    "opening_crawl",
    "director",
    "producer",
    "release_date",
];

/// A single violated field and the reason it was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validate a create payload
///
/// Required text fields must be present and non-blank; `episode_id` must be
/// present. A supplied `uid` must not be blank.
pub fn validate_draft(draft: &FilmDraft) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    require_text(&mut violations, "title", draft.title.as_deref());
    if draft.episode_id.is_none() {
        violations.push(FieldViolation::new("episode_id", "is required"));
    }
    require_text(&mut violations, "opening_crawl", draft.opening_crawl.as_deref());
    require_text(&mut violations, "director", draft.director.as_deref());
    require_text(&mut violations, "producer", draft.producer.as_deref());
    require_text(&mut violations, "release_date", draft.release_date.as_deref());
    reject_blank(&mut violations, "uid", draft.uid.as_deref());

    violations
}

/// Validate an update payload
///
/// Any field may be omitted, but a supplied required field may not be blanked.
pub fn validate_update(update: &FilmUpdate) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    reject_blank(&mut violations, "title", update.title.as_deref());
    reject_blank(&mut violations, "opening_crawl", update.opening_crawl.as_deref());
    reject_blank(&mut violations, "director", update.director.as_deref());
    reject_blank(&mut violations, "producer", update.producer.as_deref());
    reject_blank(&mut violations, "release_date", update.release_date.as_deref());
    reject_blank(&mut violations, "uid", update.uid.as_deref());

    violations
}

fn require_text(violations: &mut Vec<FieldViolation>, field: &str, value: Option<&str>) {
    match value {
        None => violations.push(FieldViolation::new(field, "is required")),
        Some(v) if v.trim().is_empty() => violations.push(FieldViolation::new(field, "is required")),
        Some(_) => {}
    }
}

fn reject_blank(violations: &mut Vec<FieldViolation>, field: &str, value: Option<&str>) {
    if let Some(v) = value {
        if v.trim().is_empty() {
            violations.push(FieldViolation::new(field, "must not be empty"));
        }
    }
}

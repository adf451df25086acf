//! Conflict resolution policy
//!
//! Decides, per incoming external film, whether the local copy may be
//! overwritten. Only the modified flag gates overwrite; content is never
//! compared, so a local edit to any field blocks every future sync write to
//! that record.

use crate::model::{ExternalRecord, Record};

/// Outcome of comparing a local record with an incoming external one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    /// No local record carries this uid
    Create,
    /// The local record is unmodified and may be overwritten
    Update {
        /// Store-local id of the record to overwrite
        id: String,
    },
    /// The local record was edited and must be left alone
    Skip {
        /// Human-readable reason recorded in the sync report
        reason: String,
    },
}

/// Decide what a sync pass does with `incoming`
pub fn decide(existing: Option<&Record>, incoming: &ExternalRecord) -> SyncDecision {
    match existing {
        None => SyncDecision::Create,
        Some(record) if !record.is_modified => SyncDecision::Update {
            id: record.id.clone(),
        },
        Some(record) => SyncDecision::Skip {
            reason: skip_reason(record, incoming),
        },
    }
}

fn skip_reason(record: &Record, incoming: &ExternalRecord) -> String {
    let uid = record.uid.as_deref().unwrap_or(&incoming.uid);
    format!(
        "Película \"{}\" (uid {}) omitida: ha sido modificada localmente",
        record.content.title, uid
    )
}

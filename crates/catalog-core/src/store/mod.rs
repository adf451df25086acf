//! Record store implementations
//!
//! This module provides the built-in implementations of the RecordStore trait:
//! - [`MemoryRecordStore`]: In-memory storage (not persistent)
//! - [`FileRecordStore`]: JSON file storage with crash recovery

pub mod file;
pub mod memory;

pub use file::{FileRecordStore, FileRecordStoreFactory};
pub use memory::{MemoryRecordStore, MemoryRecordStoreFactory};

use crate::Error;
use crate::model::Record;

/// Reject `uid` if a record other than `except_id` already carries it
pub(crate) fn ensure_unique_uid(
    records: &[Record],
    uid: &str,
    except_id: Option<&str>,
) -> Result<(), Error> {
    let taken = records
        .iter()
        .any(|r| r.uid.as_deref() == Some(uid) && Some(r.id.as_str()) != except_id);

    if taken {
        Err(Error::duplicate_key(uid))
    } else {
        Ok(())
    }
}

/// Apply `patch` to the record with `id` inside `records`, enforcing uid uniqueness
///
/// Returns `Ok(None)` when no record has that id.
pub(crate) fn apply_patch(
    records: &mut [Record],
    id: &str,
    patch: &crate::model::RecordPatch,
) -> Result<Option<Record>, Error> {
    let Some(pos) = records.iter().position(|r| r.id == id) else {
        return Ok(None);
    };

    if let Some(uid) = &patch.uid {
        ensure_unique_uid(records, uid, Some(id))?;
    }

    let record = &mut records[pos];
    record.apply(patch, chrono::Utc::now());
    Ok(Some(record.clone()))
}

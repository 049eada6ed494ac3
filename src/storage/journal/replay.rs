//! Journal replay
//!
//! Rebuilds an area's contents from journal records.

use super::{JournalEntry, JournalOp};
use crate::storage::{MemoryArea, StorageArea};
use tracing::{info, warn};

/// Replay records into an area, returning how many were applied
///
/// Records that cannot be applied are logged and skipped.
pub fn replay_entries(area: &mut MemoryArea, entries: Vec<JournalEntry>) -> usize {
    let mut replayed = 0;

    for entry in entries {
        match replay_entry(area, &entry) {
            Ok(()) => replayed += 1,
            Err(e) => warn!("Failed to replay journal record: {}. Skipping.", e),
        }
    }

    info!("Replayed {} journal records", replayed);
    replayed
}

fn replay_entry(area: &mut MemoryArea, entry: &JournalEntry) -> Result<(), String> {
    let key = std::str::from_utf8(&entry.key).map_err(|_| "key is not valid UTF-8")?;

    match entry.op {
        JournalOp::Set => {
            let value = entry
                .payload
                .first()
                .ok_or("SET record has no value")?;
            let value = std::str::from_utf8(value).map_err(|_| "value is not valid UTF-8")?;
            area.set_item(key, value).map_err(|e| e.to_string())
        }

        JournalOp::Remove => area.remove_item(key).map_err(|e| e.to_string()),
    }
}

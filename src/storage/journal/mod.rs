//! Journal-backed storage area
//!
//! Gives the durable backend real durability: every write is appended to an
//! append-only journal of checksummed binary records, and opening the area
//! replays the journal into memory.

mod entry;
mod reader;
mod replay;
mod writer;

pub use entry::{JournalEntry, JournalError, JournalOp};
pub use reader::JournalReader;
pub use replay::replay_entries;
pub use writer::JournalWriter;

use super::{MemoryArea, StorageArea, StorageError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Journal sync policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Sync after every write (safest, slowest)
    Always,
    /// Sync at most once per second
    #[default]
    EverySecond,
    /// Let the OS decide when to sync
    No,
}

/// Journal configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    /// Path to the journal file
    pub path: PathBuf,
    #[serde(default)]
    pub sync_policy: SyncPolicy,
}

impl JournalConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JournalConfig {
            path: path.into(),
            sync_policy: SyncPolicy::default(),
        }
    }
}

/// A storage area persisted to a journal file
pub struct JournalArea {
    items: MemoryArea,
    writer: JournalWriter,
    path: PathBuf,
    sync_policy: SyncPolicy,
}

impl JournalArea {
    /// Open the journal, replaying any existing records
    pub fn open(config: &JournalConfig) -> Result<Self, StorageError> {
        let mut items = MemoryArea::new();

        if config.path.exists() {
            info!("Loading journal from {:?}", config.path);
            let reader = JournalReader::load(&config.path)?;
            let (entries, valid_len) = reader.parse();
            replay_entries(&mut items, entries);

            // New records must follow the last valid one, not the garbage
            if valid_len < reader.size() {
                warn!(
                    "Truncating journal {:?} from {} to {} bytes",
                    config.path,
                    reader.size(),
                    valid_len
                );
                let file = fs::OpenOptions::new().write(true).open(&config.path)?;
                file.set_len(valid_len as u64)?;
                file.sync_all()?;
            }
        }

        let writer = JournalWriter::open(&config.path, config.sync_policy)?;

        Ok(JournalArea {
            items,
            writer,
            path: config.path.clone(),
            sync_policy: config.sync_policy,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the journal so it holds one record per live key
    pub fn compact(&mut self) -> Result<(), StorageError> {
        let staging = self.path.with_extension("compact");

        {
            let mut staged = JournalWriter::open(&staging, SyncPolicy::No)?;
            staged.truncate()?;
            for key in self.items.keys()? {
                if let Some(value) = self.items.get_item(&key)? {
                    staged.append(&JournalEntry::set(&key, &value))?;
                }
            }
            staged.sync()?;
        }

        fs::rename(&staging, &self.path)?;
        self.writer = JournalWriter::open(&self.path, self.sync_policy)?;
        info!("Compacted journal {:?} to {} records", self.path, self.items.len());
        Ok(())
    }

    /// Force pending records to disk
    pub fn sync(&mut self) -> Result<(), StorageError> {
        Ok(self.writer.sync()?)
    }
}

impl StorageArea for JournalArea {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.items.get_item(key)
    }

    /// The record is written before memory changes, so a failed append
    /// leaves the area untouched
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writer.append(&JournalEntry::set(key, value))?;
        self.items.set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if self.items.get_item(key)?.is_none() {
            return Ok(());
        }
        self.writer.append(&JournalEntry::remove(key))?;
        self.items.remove_item(key)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.writer.truncate()?;
        self.items.clear()
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.items.keys()
    }

    /// Probing only touches memory; it never reaches the journal
    fn probe(&mut self) -> Result<(), StorageError> {
        self.items.probe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &tempfile::TempDir) -> JournalConfig {
        JournalConfig {
            path: dir.path().join("local.journal"),
            sync_policy: SyncPolicy::Always,
        }
    }

    #[test]
    fn test_reopen_restores_items() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        {
            let mut area = JournalArea::open(&config).unwrap();
            area.set_item("theme", "dark").unwrap();
            area.set_item("count", "5").unwrap();
            area.remove_item("count").unwrap();
        }

        let area = JournalArea::open(&config).unwrap();
        assert_eq!(area.get_item("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(area.get_item("count").unwrap(), None);
    }

    #[test]
    fn test_clear_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        {
            let mut area = JournalArea::open(&config).unwrap();
            area.set_item("a", "1").unwrap();
            area.clear().unwrap();
            area.set_item("b", "2").unwrap();
        }

        let area = JournalArea::open(&config).unwrap();
        assert_eq!(area.keys().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_remove_missing_key_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let mut area = JournalArea::open(&config).unwrap();
        area.remove_item("ghost").unwrap();
        assert_eq!(fs::metadata(area.path()).unwrap().len(), 0);
    }

    #[test]
    fn test_probe_does_not_touch_journal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let mut area = JournalArea::open(&config).unwrap();
        area.probe().unwrap();
        assert_eq!(fs::metadata(area.path()).unwrap().len(), 0);
    }

    #[test]
    fn test_writes_after_torn_tail_survive() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        {
            let mut area = JournalArea::open(&config).unwrap();
            area.set_item("before", "1").unwrap();
        }

        // Crash in the middle of a record
        let torn = JournalEntry::set("torn", "x").to_bytes();
        let mut file = fs::OpenOptions::new().append(true).open(&config.path).unwrap();
        std::io::Write::write_all(&mut file, &torn[..torn.len() / 2]).unwrap();
        drop(file);

        {
            let mut area = JournalArea::open(&config).unwrap();
            assert_eq!(area.keys().unwrap(), vec!["before"]);
            area.set_item("after", "2").unwrap();
        }

        let area = JournalArea::open(&config).unwrap();
        assert_eq!(area.keys().unwrap(), vec!["after", "before"]);
        assert_eq!(area.get_item("after").unwrap().as_deref(), Some("2"));

        let valid = JournalEntry::set("before", "1").to_bytes().len()
            + JournalEntry::set("after", "2").to_bytes().len();
        assert_eq!(fs::metadata(&config.path).unwrap().len() as usize, valid);
    }

    #[test]
    fn test_compact() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        {
            let mut area = JournalArea::open(&config).unwrap();
            for i in 0..10 {
                area.set_item("counter", &i.to_string()).unwrap();
            }
            area.set_item("other", "x").unwrap();

            let before = fs::metadata(area.path()).unwrap().len();
            area.compact().unwrap();
            let after = fs::metadata(area.path()).unwrap().len();
            assert!(after < before);

            // Writes after compaction land in the new file
            area.set_item("late", "y").unwrap();
        }

        let area = JournalArea::open(&config).unwrap();
        assert_eq!(area.keys().unwrap(), vec!["counter", "late", "other"]);
        assert_eq!(area.get_item("counter").unwrap().as_deref(), Some("9"));
    }
}

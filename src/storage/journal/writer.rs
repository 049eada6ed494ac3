//! Journal writer
//!
//! Appends records to the journal file.

use super::{JournalEntry, SyncPolicy};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::warn;

pub struct JournalWriter {
    file: File,
    sync_policy: SyncPolicy,
    last_sync: Instant,
}

impl JournalWriter {
    /// Open (or create) the journal for appending
    pub fn open<P: AsRef<Path>>(path: P, sync_policy: SyncPolicy) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(JournalWriter {
            file,
            sync_policy,
            last_sync: Instant::now(),
        })
    }

    /// Append a record
    pub fn append(&mut self, entry: &JournalEntry) -> io::Result<()> {
        self.file.write_all(&entry.to_bytes())?;

        match self.sync_policy {
            SyncPolicy::Always => self.sync()?,
            SyncPolicy::EverySecond => {
                if self.last_sync.elapsed() >= Duration::from_secs(1) {
                    self.sync()?;
                }
            }
            SyncPolicy::No => {}
        }

        Ok(())
    }

    /// Drop every record
    pub fn truncate(&mut self) -> io::Result<()> {
        self.file.set_len(0)?;
        self.sync()
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()?;
        self.last_sync = Instant::now();
        Ok(())
    }
}

/// Records appended since the last periodic sync reach the disk on close
impl Drop for JournalWriter {
    fn drop(&mut self) {
        if self.sync_policy == SyncPolicy::No {
            return;
        }
        if let Err(e) = self.sync() {
            warn!("Failed to sync journal on close: {}", e);
        }
    }
}

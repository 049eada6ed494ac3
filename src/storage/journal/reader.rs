//! Journal reader

use super::JournalEntry;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{error, info, warn};

/// Loaded journal contents
pub struct JournalReader {
    data: Vec<u8>,
}

impl JournalReader {
    /// Load the whole journal file
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(JournalReader {
            data: fs::read(path)?,
        })
    }

    /// Parse all records
    ///
    /// Stops at the first corrupt record; everything before it is kept.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.parse().0
    }

    /// Parse all records, also returning the length of the valid prefix
    ///
    /// The length is smaller than `size()` when the journal has a corrupt
    /// or torn tail.
    pub fn parse(&self) -> (Vec<JournalEntry>, usize) {
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < self.data.len() {
            match JournalEntry::from_bytes(&self.data[pos..]) {
                Ok((entry, size)) => {
                    entries.push(entry);
                    pos += size;
                }
                Err(e) => {
                    error!("Corrupt journal record at byte {}: {}", pos, e);
                    warn!(
                        "Journal replay stopped early; {} records recovered, {} bytes ignored",
                        entries.len(),
                        self.data.len() - pos
                    );
                    return (entries, pos);
                }
            }
        }

        info!("Journal loaded: {} records", entries.len());
        (entries, pos)
    }

    /// Size of the journal in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

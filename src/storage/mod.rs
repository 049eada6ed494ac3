//! Storage primitives
//!
//! The mechanisms the backends sit on: string-only storage areas (session
//! and durable), a cookie jar, and the current page location. They are
//! handed to the backends as shared handles so one execution context owns
//! them and every backend sees the same state.

mod cookie_jar;
mod environment;
mod journal;
mod location;
mod memory;

pub use cookie_jar::{CookieJar, MemoryCookieJar, StoredCookie};
pub use environment::Environment;
pub use journal::{
    JournalArea, JournalConfig, JournalEntry, JournalError, JournalOp, JournalReader,
    JournalWriter, SyncPolicy,
};
pub use location::Location;
pub use memory::MemoryArea;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Key written and removed by the capability probe
pub const PROBE_KEY: &str = "__vault_probe__";

/// Errors raised by storage primitives
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The mechanism refuses access (disabled, private mode)
    #[error("storage is unavailable: {0}")]
    Unavailable(String),

    /// A write would exceed the area's quota
    #[error("quota exceeded: {requested} bytes requested, {used} of {limit} bytes used")]
    QuotaExceeded {
        requested: usize,
        used: usize,
        limit: usize,
    },

    /// Persistence failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be decoded
    #[error("corrupt data: {0}")]
    Corrupt(String),
}

/// A string-only key/value area, in the shape of the web storage API
pub trait StorageArea: Send {
    /// Read an item; `Ok(None)` when absent
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write an item, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete an item; deleting a missing key is not an error
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;

    /// Delete every item
    fn clear(&mut self) -> Result<(), StorageError>;

    /// All keys currently stored, in a stable order
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Check that the area can be written and read back
    fn probe(&mut self) -> Result<(), StorageError> {
        self.set_item(PROBE_KEY, PROBE_KEY)?;
        let read = self.get_item(PROBE_KEY)?;
        self.remove_item(PROBE_KEY)?;

        match read.as_deref() {
            Some(PROBE_KEY) => Ok(()),
            _ => Err(StorageError::Unavailable(
                "probe value did not read back".to_string(),
            )),
        }
    }
}

/// Shared handle to a storage area
pub type AreaHandle = Arc<Mutex<dyn StorageArea>>;

/// Shared handle to a cookie jar
pub type JarHandle = Arc<Mutex<dyn CookieJar>>;

/// Wrap a storage area into a shared handle
pub fn area_handle<A: StorageArea + 'static>(area: A) -> AreaHandle {
    Arc::new(Mutex::new(area))
}

/// Wrap a cookie jar into a shared handle
pub fn jar_handle<J: CookieJar + 'static>(jar: J) -> JarHandle {
    Arc::new(Mutex::new(jar))
}

/// Lock a handle, recovering the guard if a previous holder panicked
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//! In-memory storage area

use super::{StorageArea, StorageError};
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

/// Type alias for our hash map with SipHasher
type AreaMap = HashMap<String, String, BuildHasherDefault<SipHasher13>>;

/// In-memory storage area
///
/// Backs the session backend, and the durable backend when no journal is
/// configured. A quota can be set to reproduce full-storage failures, and an
/// area can be created disabled to reproduce a browser that refuses storage
/// access altogether.
pub struct MemoryArea {
    /// The stored items
    items: AreaMap,

    /// Bytes used by keys and values
    used_bytes: usize,

    /// Optional byte limit for keys and values
    quota: Option<usize>,

    /// Every access fails when set
    disabled: bool,
}

impl MemoryArea {
    /// Create a new area with default capacity
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create a new area with specified initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        MemoryArea {
            items: HashMap::with_capacity_and_hasher(
                capacity,
                BuildHasherDefault::<SipHasher13>::default(),
            ),
            used_bytes: 0,
            quota: None,
            disabled: false,
        }
    }

    /// Create an area limited to `limit` bytes of keys and values
    pub fn with_quota(limit: usize) -> Self {
        MemoryArea {
            quota: Some(limit),
            ..Self::new()
        }
    }

    /// Create an area that refuses every access
    pub fn disabled() -> Self {
        MemoryArea {
            disabled: true,
            ..Self::new()
        }
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bytes used by keys and values
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    fn check_enabled(&self) -> Result<(), StorageError> {
        if self.disabled {
            Err(StorageError::Unavailable("access to storage is denied".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryArea {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageArea for MemoryArea {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_enabled()?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_enabled()?;

        let previous = self
            .items
            .get(key)
            .map(|old| key.len() + old.len())
            .unwrap_or(0);
        let requested = key.len() + value.len();
        let used = self.used_bytes - previous;

        if let Some(limit) = self.quota {
            if used + requested > limit {
                return Err(StorageError::QuotaExceeded {
                    requested,
                    used,
                    limit,
                });
            }
        }

        self.items.insert(key.to_string(), value.to_string());
        self.used_bytes = used + requested;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.check_enabled()?;

        if let Some(old) = self.items.remove(key) {
            self.used_bytes -= key.len() + old.len();
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.check_enabled()?;
        self.items.clear();
        self.used_bytes = 0;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.check_enabled()?;
        let mut keys: Vec<String> = self.items.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_set_get() {
        let mut area = MemoryArea::new();
        area.set_item("key1", "value1").unwrap();

        assert_eq!(area.get_item("key1").unwrap().as_deref(), Some("value1"));
        assert_eq!(area.get_item("key2").unwrap(), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut area = MemoryArea::new();
        area.set_item("key1", "value1").unwrap();

        area.remove_item("key1").unwrap();
        area.remove_item("key1").unwrap();
        assert!(area.is_empty());
        assert_eq!(area.used_bytes(), 0);
    }

    #[test]
    fn test_keys_sorted() {
        let mut area = MemoryArea::new();
        area.set_item("b", "2").unwrap();
        area.set_item("a", "1").unwrap();
        area.set_item("c", "3").unwrap();

        assert_eq!(area.keys().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_quota() {
        let mut area = MemoryArea::with_quota(10);
        area.set_item("k", "12345").unwrap();

        // Replacing accounts for the old value
        area.set_item("k", "123456789").unwrap();
        assert_eq!(area.used_bytes(), 10);

        let err = area.set_item("x", "1").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 10, .. }));
        assert_eq!(area.get_item("x").unwrap(), None);
    }

    #[test]
    fn test_disabled() {
        let mut area = MemoryArea::disabled();
        assert!(matches!(area.get_item("k"), Err(StorageError::Unavailable(_))));
        assert!(area.set_item("k", "v").is_err());
        assert!(area.probe().is_err());
    }

    #[test]
    fn test_probe_leaves_no_trace() {
        let mut area = MemoryArea::new();
        area.probe().unwrap();
        assert!(area.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut area = MemoryArea::new();
        area.set_item("key1", "value1").unwrap();
        area.set_item("key2", "value2").unwrap();

        area.clear().unwrap();
        assert_eq!(area.len(), 0);
        assert!(area.keys().unwrap().is_empty());
    }
}

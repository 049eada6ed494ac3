//! Per-key metadata
//!
//! Session and durable areas keep, next to the values, one extra item under
//! a reserved key: a JSON dictionary `{ key: { expires?, path? } }`. The
//! dictionary and the values are independent items and can drift apart;
//! every read here tolerates that.

use crate::config::SetOptions;
use crate::storage::{StorageArea, StorageError};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Reserved key of the metadata dictionary
pub const DEFAULT_META_KEY: &str = "__vaultData";

/// Metadata for one key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMeta {
    /// Expiration, milliseconds since UNIX epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,

    /// Path scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl KeyMeta {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires, Some(at) if at <= now.timestamp_millis())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires.and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    /// Whether the entry is readable from `current_path`
    ///
    /// The scope is a regular expression searched anywhere in the path, so
    /// `/admin` also matches `/admin/users`. A scope that is not a valid
    /// expression is matched as a plain substring.
    pub fn path_matches(&self, current_path: &str) -> bool {
        match self.path.as_deref() {
            None | Some("") => true,
            Some(scope) => match Regex::new(scope) {
                Ok(re) => re.is_match(current_path),
                Err(_) => current_path.contains(scope),
            },
        }
    }
}

/// The whole dictionary, ordered by key
pub type MetaDictionary = BTreeMap<String, KeyMeta>;

/// Reads and writes the metadata dictionary of one area
#[derive(Debug, Clone)]
pub struct MetadataStore {
    key: String,
}

impl MetadataStore {
    pub fn new(key: impl Into<String>) -> Self {
        MetadataStore { key: key.into() }
    }

    /// The reserved key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the dictionary, failing on unreadable or undecodable data
    pub fn load(&self, area: &dyn StorageArea) -> Result<MetaDictionary, StorageError> {
        match area.get_item(&self.key)? {
            Some(raw) if !raw.is_empty() => serde_json::from_str(&raw)
                .map_err(|e| StorageError::Corrupt(format!("metadata dictionary: {}", e))),
            _ => Ok(MetaDictionary::new()),
        }
    }

    /// Load the dictionary, empty if absent or undecodable
    pub fn get(&self, area: &dyn StorageArea) -> MetaDictionary {
        self.load(area).unwrap_or_else(|e| {
            debug!("Treating metadata as empty: {}", e);
            MetaDictionary::new()
        })
    }

    /// Record `options` for `key`, replacing any previous metadata
    pub fn set_meta(
        &self,
        area: &mut dyn StorageArea,
        key: &str,
        options: &SetOptions,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut dictionary = self.get(area);
        let meta = dictionary.entry(key.to_string()).or_default();

        meta.expires = options.expiry().and_then(|expires| {
            let at = expires.resolve(now);
            if at.is_none() {
                warn!("Ignoring unparseable expiration {:?} for '{}'", expires, key);
            }
            at.map(|at| at.timestamp_millis())
        });
        meta.path = options.scoped_path().map(str::to_string);

        self.persist(area, &dictionary)
    }

    /// Forget `key`
    pub fn clear_meta(&self, area: &mut dyn StorageArea, key: &str) -> Result<(), StorageError> {
        let mut dictionary = self.load(area)?;
        if dictionary.remove(key).is_none() {
            return Ok(());
        }
        self.persist(area, &dictionary)
    }

    /// Metadata for `key`, `None` if absent or the dictionary is undecodable
    pub fn get_meta(&self, area: &dyn StorageArea, key: &str) -> Option<KeyMeta> {
        match self.load(area) {
            Ok(mut dictionary) => dictionary.remove(key),
            Err(e) => {
                debug!("No metadata for '{}': {}", key, e);
                None
            }
        }
    }

    fn persist(&self, area: &mut dyn StorageArea, dictionary: &MetaDictionary) -> Result<(), StorageError> {
        let raw = serde_json::to_string(dictionary)
            .map_err(|e| StorageError::Corrupt(format!("metadata dictionary: {}", e)))?;
        area.set_item(&self.key, &raw)
    }
}

impl Default for MetadataStore {
    fn default() -> Self {
        MetadataStore::new(DEFAULT_META_KEY)
    }
}

//! Session and durable storage backend

use super::{describe, Backend, BackendKind, ListEntry};
use crate::codec::{self, Value};
use crate::config::SetOptions;
use crate::meta::{KeyMeta, MetadataStore};
use crate::storage::{lock, AreaHandle, Location, StorageArea, StorageError};
use chrono::Utc;
use std::io::{self, Write};
use tracing::{debug, info, warn};

/// Backend over a web-storage area
///
/// Values and their metadata live in the same area as two independent
/// items: the value under its own key, the metadata inside the dictionary
/// under the reserved key.
pub struct WebStorageBackend {
    kind: BackendKind,
    area: AreaHandle,
    meta: MetadataStore,
    location: Location,
}

impl WebStorageBackend {
    pub fn new(kind: BackendKind, area: AreaHandle, meta_key: &str, location: Location) -> Self {
        WebStorageBackend {
            kind,
            area,
            meta: MetadataStore::new(meta_key),
            location,
        }
    }

    /// The underlying area
    pub fn area(&self) -> &AreaHandle {
        &self.area
    }

    /// Metadata recorded for `key`
    pub fn metadata(&self, key: &str) -> Option<KeyMeta> {
        self.meta.get_meta(&*lock(&self.area), key)
    }

    /// Metadata first, then the value; no rollback if the second write fails
    fn write(&self, key: &str, value: &Value, options: &SetOptions) -> Result<(), StorageError> {
        let mut area = lock(&self.area);
        self.meta.set_meta(&mut *area, key, options, Utc::now())?;
        area.set_item(key, &codec::encode(value))
    }

    fn remove_from(&self, area: &mut dyn StorageArea, key: &str) {
        if let Err(e) = self.meta.clear_meta(area, key) {
            debug!("Could not clear metadata for '{}' in {}: {}", key, self.kind, e);
        }
        if let Err(e) = area.remove_item(key) {
            warn!("Vault: could not remove '{}' from {}: {}", key, self.kind, e);
        }
    }

    /// Keys holding user values; the metadata dictionary is not one of them
    fn user_keys(&self, area: &dyn StorageArea) -> Vec<String> {
        match area.keys() {
            Ok(keys) => keys.into_iter().filter(|k| k != self.meta.key()).collect(),
            Err(e) => {
                warn!("Vault: could not list {}: {}", self.kind, e);
                Vec::new()
            }
        }
    }
}

impl Backend for WebStorageBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn set(&self, key: &str, value: &Value, options: &SetOptions) {
        if key.is_empty() {
            warn!("Vault: set was called with no key.");
            return;
        }
        if key == self.meta.key() {
            warn!("Vault: '{}' is reserved for metadata in {}.", key, self.kind);
            return;
        }

        if let Err(e) = self.write(key, value, options) {
            warn!(
                "Vault: I cannot write to {} even though it is supported. Here is the error: {}",
                self.kind, e
            );
        }
    }

    fn get(&self, key: &str, default: Option<Value>) -> Option<Value> {
        let mut area = lock(&self.area);

        // An empty string reads as absent
        let raw = match area.get_item(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return default,
            Err(e) => {
                warn!("Vault: could not read '{}' from {}: {}", key, self.kind, e);
                return default;
            }
        };

        if let Some(meta) = self.meta.get_meta(&*area, key) {
            let path = self.location.path();
            if !meta.path_matches(&path) {
                debug!(
                    "Data found for '{}' but paths do not match: at {}, scoped to {:?}",
                    key, path, meta.path
                );
                return default;
            }

            if meta.is_expired(Utc::now()) {
                let expired = meta
                    .expires_at()
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default();
                info!("Removing expired item: {}. It expired on: {}", key, expired);
                self.remove_from(&mut *area, key);
                return default;
            }
        }

        codec::decode(&raw)
    }

    fn remove(&self, key: &str) {
        let mut area = lock(&self.area);
        self.remove_from(&mut *area, key);
    }

    fn clear(&self) {
        if let Err(e) = lock(&self.area).clear() {
            warn!("Vault: could not clear {}: {}", self.kind, e);
        }
    }

    fn list(&self, raw: bool, out: &mut dyn Write) -> io::Result<()> {
        let keys = self.user_keys(&*lock(&self.area));
        if keys.is_empty() {
            return writeln!(out, "0 items in {}", self.kind);
        }

        for key in keys {
            let value = if raw {
                let stored = lock(&self.area).get_item(&key).ok().flatten();
                stored.and_then(|s| codec::decode(&s))
            } else {
                self.get(&key, None)
            };
            writeln!(out, "{} = {}", key, describe(value.as_ref()))?;
        }
        Ok(())
    }

    fn get_list(&self) -> Vec<ListEntry> {
        let keys = self.user_keys(&*lock(&self.area));

        keys.into_iter()
            .map(|key| {
                let value = self.get(&key, None);
                ListEntry::new(key, value)
            })
            .collect()
    }
}

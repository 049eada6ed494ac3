//! Backend adapters
//!
//! Every backend offers the same contract over a different mechanism:
//! session storage, durable storage, and cookies. Backends never surface
//! errors; failures are logged and reads degrade to the default value.

mod cookie;
mod fallback;
mod web;

pub use cookie::{CookieBackend, COOKIE_EPOCH};
pub use fallback::CookieFallback;
pub use web::WebStorageBackend;

use crate::codec::Value;
use crate::config::SetOptions;
use crate::storage::{lock, AreaHandle, Location};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::warn;

/// The role a backend plays in the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Per-tab storage
    Session,
    /// Durable per-origin storage
    Durable,
    Cookie,
}

impl BackendKind {
    /// Section label used in listings
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::Session => "Session",
            BackendKind::Durable => "Local",
            BackendKind::Cookie => "Cookie",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Session => "sessionStorage",
            BackendKind::Durable => "localStorage",
            BackendKind::Cookie => "cookies",
        })
    }
}

/// One key of a `get_list` snapshot, serialized as `{ key: value }`
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub key: String,
    pub value: Option<Value>,
}

impl ListEntry {
    pub fn new(key: impl Into<String>, value: Option<Value>) -> Self {
        ListEntry {
            key: key.into(),
            value,
        }
    }
}

impl Serialize for ListEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.value)?;
        map.end()
    }
}

/// The contract shared by all backends
pub trait Backend: Send + Sync {
    /// The role this backend fills
    fn kind(&self) -> BackendKind;

    /// Whether this backend stands in for an unavailable mechanism
    fn is_fallback(&self) -> bool {
        false
    }

    /// Store `value` under `key`; an empty key is a logged no-op
    fn set(&self, key: &str, value: &Value, options: &SetOptions);

    /// Read `key`, or `default` when absent, expired or out of path scope
    fn get(&self, key: &str, default: Option<Value>) -> Option<Value>;

    /// Read `key`, then remove it whatever the read returned
    fn get_and_remove(&self, key: &str) -> Option<Value> {
        let value = self.get(key, None);
        self.remove(key);
        value
    }

    /// Delete `key` and its metadata; removing a missing key is fine
    fn remove(&self, key: &str);

    /// Delete every key owned by this backend
    fn clear(&self);

    /// Print every key for inspection; `raw` skips expiry and path checks
    fn list(&self, raw: bool, out: &mut dyn Write) -> io::Result<()>;

    /// One entry per stored key, each resolved as `get` would
    fn get_list(&self) -> Vec<ListEntry>;
}

/// Render a value for listings
pub(crate) fn describe(value: Option<&Value>) -> String {
    match value {
        Some(Value::Text(s)) => format!("{:?}", s),
        Some(other) => other.to_string(),
        None => "undefined".to_string(),
    }
}

/// Build the backend for a web-storage role
///
/// The area is probed once; if it cannot be used, the role is handed to
/// the cookie backend for the lifetime of the vault.
pub fn open_web_backend(
    kind: BackendKind,
    area: AreaHandle,
    meta_key: &str,
    location: &Location,
    cookie: &Arc<CookieBackend>,
) -> Arc<dyn Backend> {
    let probe = lock(&area).probe();

    match probe {
        Ok(()) => Arc::new(WebStorageBackend::new(kind, area, meta_key, location.clone())),
        Err(e) => {
            warn!(
                "Vault: {} is not supported ({}). I will attempt to use Cookies instead.",
                kind, e
            );
            Arc::new(CookieFallback::new(kind, Arc::clone(cookie)))
        }
    }
}

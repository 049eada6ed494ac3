//! Vault facade
//!
//! Routes writes to one backend and reads through all of them:
//!
//! - `set` goes to durable storage when an expiration is given, to session
//!   storage otherwise. Cookies are only written through `cookie()`.
//! - `get` tries session, then durable, then cookies, and returns the first
//!   defined value. A stored `null` is defined and stops the search.
//! - `remove` and `clear` are applied to all three backends.

use crate::backend::{open_web_backend, Backend, BackendKind, CookieBackend, ListEntry};
use crate::codec::Value;
use crate::config::{SetOptions, VaultConfig};
use crate::storage::{Environment, Location, StorageError};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::info;

/// Snapshot of every backend, for inspection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultLists {
    #[serde(rename = "Local")]
    pub local: Vec<ListEntry>,
    #[serde(rename = "Session")]
    pub session: Vec<ListEntry>,
    #[serde(rename = "Cookie")]
    pub cookie: Vec<ListEntry>,
}

impl VaultLists {
    /// No backend holds anything
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.session.is_empty() && self.cookie.is_empty()
    }
}

/// One storage facade per execution context
pub struct Vault {
    session: Arc<dyn Backend>,
    local: Arc<dyn Backend>,
    cookie: Arc<CookieBackend>,
    location: Location,
}

impl Vault {
    /// Build the backends over `env`, probing session and durable storage
    pub fn new(env: Environment, config: &VaultConfig) -> Self {
        let cookie = Arc::new(CookieBackend::new(env.cookies, env.location.clone()));
        let session = open_web_backend(
            BackendKind::Session,
            env.session,
            &config.meta_key,
            &env.location,
            &cookie,
        );
        let local = open_web_backend(
            BackendKind::Durable,
            env.local,
            &config.meta_key,
            &env.location,
            &cookie,
        );

        Vault {
            session,
            local,
            cookie,
            location: env.location,
        }
    }

    /// A vault with every mechanism in memory
    pub fn in_memory() -> Self {
        Vault::new(Environment::in_memory(), &VaultConfig::default())
    }

    /// Build the environment described by `config`, then the vault over it
    pub fn open(config: &VaultConfig) -> Result<Self, StorageError> {
        let env = Environment::from_config(config)?;
        let vault = Vault::new(env, config);
        info!(
            "Vault opened at {} (session: {}, local: {})",
            vault.location.path(),
            mechanism(&vault.session),
            mechanism(&vault.local)
        );
        Ok(vault)
    }

    pub fn session(&self) -> &Arc<dyn Backend> {
        &self.session
    }

    pub fn local(&self) -> &Arc<dyn Backend> {
        &self.local
    }

    pub fn cookie(&self) -> &Arc<CookieBackend> {
        &self.cookie
    }

    /// Direct access to one backend
    pub fn backend(&self, kind: BackendKind) -> &dyn Backend {
        match kind {
            BackendKind::Session => &*self.session,
            BackendKind::Durable => &*self.local,
            BackendKind::Cookie => &*self.cookie,
        }
    }

    /// The page location paths are resolved against
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Store a value; with an expiration it goes to durable storage
    pub fn set(&self, key: &str, value: &Value, options: &SetOptions) {
        if options.expiry().is_some() {
            self.local.set(key, value, options)
        } else {
            self.session.set(key, value, options)
        }
    }

    /// First defined value from session, durable, then cookie storage
    pub fn get(&self, key: &str, default: Option<Value>) -> Option<Value> {
        self.session
            .get(key, None)
            .or_else(|| self.local.get(key, None))
            .or_else(|| self.cookie.get(key, None))
            .or(default)
    }

    /// Read through the fallback chain, then remove everywhere
    pub fn get_and_remove(&self, key: &str) -> Option<Value> {
        let value = self.get(key, None);
        self.remove(key);
        value
    }

    /// Remove from every backend
    pub fn remove(&self, key: &str) {
        self.local.remove(key);
        self.session.remove(key);
        self.cookie.remove(key);
    }

    /// Clear every backend
    pub fn clear(&self) {
        self.local.clear();
        self.session.clear();
        self.cookie.clear();
    }

    /// Print every backend, one section each
    pub fn list(&self, raw: bool, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "--== Local ==--")?;
        self.local.list(raw, out)?;
        writeln!(out, "--== Session ==--")?;
        self.session.list(raw, out)?;
        writeln!(out, "--== Cookie ==--")?;
        self.cookie.list(raw, out)
    }

    pub fn get_lists(&self) -> VaultLists {
        VaultLists {
            local: self.local.get_list(),
            session: self.session.get_list(),
            cookie: self.cookie.get_list(),
        }
    }
}

fn mechanism(backend: &Arc<dyn Backend>) -> &'static str {
    if backend.is_fallback() {
        "cookies"
    } else {
        "storage"
    }
}

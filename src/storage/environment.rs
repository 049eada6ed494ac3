//! Execution environment
//!
//! Bundles the handles a vault is built from: one area per web-storage
//! backend, the cookie jar and the page location.

use super::{
    area_handle, jar_handle, AreaHandle, JarHandle, JournalArea, JournalConfig, Location,
    MemoryArea, MemoryCookieJar, StorageError,
};
use crate::config::VaultConfig;

/// Storage handles for one execution context
#[derive(Clone)]
pub struct Environment {
    /// Per-tab storage, gone with the process
    pub session: AreaHandle,

    /// Durable per-origin storage
    pub local: AreaHandle,

    pub cookies: JarHandle,

    pub location: Location,
}

impl Environment {
    /// Everything in memory, page at `/`
    pub fn in_memory() -> Self {
        Environment {
            session: area_handle(MemoryArea::new()),
            local: area_handle(MemoryArea::new()),
            cookies: jar_handle(MemoryCookieJar::new()),
            location: Location::default(),
        }
    }

    /// Durable storage persisted to a journal, the rest in memory
    pub fn with_journal(config: &JournalConfig) -> Result<Self, StorageError> {
        Ok(Environment {
            local: area_handle(JournalArea::open(config)?),
            ..Self::in_memory()
        })
    }

    /// Build from a vault configuration
    pub fn from_config(config: &VaultConfig) -> Result<Self, StorageError> {
        let env = match &config.journal {
            Some(journal) => Self::with_journal(journal)?,
            None => Self::in_memory(),
        };
        env.location.navigate(config.initial_path.clone());
        Ok(env)
    }

    /// Replace the session area
    pub fn with_session(mut self, session: AreaHandle) -> Self {
        self.session = session;
        self
    }

    /// Replace the durable area
    pub fn with_local(mut self, local: AreaHandle) -> Self {
        self.local = local;
        self
    }

    /// Replace the cookie jar
    pub fn with_cookies(mut self, cookies: JarHandle) -> Self {
        self.cookies = cookies;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::lock;

    #[test]
    fn test_from_config_sets_path() {
        let config = VaultConfig {
            initial_path: "/app".to_string(),
            ..VaultConfig::default()
        };

        let env = Environment::from_config(&config).unwrap();
        assert_eq!(env.location.path(), "/app");
    }

    #[test]
    fn test_from_config_with_journal() {
        let dir = tempfile::tempdir().unwrap();
        let config = VaultConfig {
            journal: Some(JournalConfig::new(dir.path().join("env.journal"))),
            ..VaultConfig::default()
        };

        let env = Environment::from_config(&config).unwrap();
        lock(&env.local).set_item("k", "v").unwrap();
        assert!(dir.path().join("env.journal").exists());
    }
}

//! Configuration
//!
//! `SetOptions` is the per-write configuration object accepted by every
//! backend. `VaultConfig` holds the settings used to build a vault.

use crate::expires::Expires;
use crate::meta::DEFAULT_META_KEY;
use crate::storage::JournalConfig;
use anyhow::Context;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Cookie `SameSite` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SameSite {
    #[serde(alias = "strict")]
    Strict,
    #[serde(alias = "lax")]
    Lax,
    #[serde(alias = "none")]
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

impl std::str::FromStr for SameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            "none" => Ok(SameSite::None),
            _ => Err(format!("invalid SameSite value '{}'", s)),
        }
    }
}

/// Options for a single write
///
/// Session and durable backends only look at `expires` and `path`; the
/// cookie backend turns every field into a cookie attribute.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SetOptions {
    /// Relative or absolute expiration
    pub expires: Option<Expires>,

    /// Path scope
    pub path: Option<String>,

    /// Cookie domain
    pub domain: Option<String>,

    /// Cookie max-age in seconds
    #[serde(alias = "maxAge", alias = "max-age")]
    pub max_age: Option<i64>,

    /// Cookie SameSite attribute
    #[serde(rename = "sameSite", alias = "same_site")]
    pub same_site: Option<SameSite>,

    /// Cookie secure flag
    pub secure: bool,
}

impl SetOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expires(mut self, expires: impl Into<Expires>) -> Self {
        self.expires = Some(expires.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// The expiration, if one was actually given
    pub fn expiry(&self) -> Option<&Expires> {
        self.expires.as_ref().filter(|e| !e.is_empty())
    }

    /// The path scope, if non-empty
    pub fn scoped_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }

    /// The cookie domain, if non-empty
    pub fn scoped_domain(&self) -> Option<&str> {
        self.domain.as_deref().filter(|d| !d.is_empty())
    }

    /// `SameSite=None` requires the secure flag
    pub fn requires_secure(&self) -> bool {
        self.secure || self.same_site == Some(SameSite::None)
    }
}

/// Settings used to build a vault
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Reserved key holding the metadata dictionary in each storage area
    pub meta_key: String,

    /// Page path the vault starts at
    pub initial_path: String,

    /// Persist the durable backend to an append-only journal
    pub journal: Option<JournalConfig>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        VaultConfig {
            meta_key: DEFAULT_META_KEY.to_string(),
            initial_path: "/".to_string(),
            journal: None,
        }
    }
}

impl VaultConfig {
    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: VaultConfig = serde_json::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }
}

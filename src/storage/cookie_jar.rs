//! Cookie jar
//!
//! Models `document.cookie`: reading yields the `name=value; name=value`
//! string visible from a path, writing takes a single `Set-Cookie`-style
//! string with attributes. There is no delete primitive; a cookie goes away
//! when it is written with an expiry in the past.

use super::StorageError;
use crate::expires::parse_absolute;
use chrono::{DateTime, Duration, Utc};

/// A cookie held by the jar
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCookie {
    pub name: String,
    /// Value exactly as written (already percent-encoded by the writer)
    pub value: String,
    pub path: String,
    pub domain: Option<String>,
    /// `None` for a session cookie
    pub expires: Option<DateTime<Utc>>,
    pub same_site: Option<String>,
    pub secure: bool,
}

impl StoredCookie {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires, Some(at) if at <= now)
    }

    /// Cookies are identified by (name, path, domain)
    fn same_slot(&self, other: &StoredCookie) -> bool {
        self.name == other.name && self.path == other.path && self.domain == other.domain
    }
}

/// The `document.cookie` contract
pub trait CookieJar: Send {
    /// Cookies visible from `path`, as `name=value` pairs joined by `"; "`
    fn cookie_string(&self, path: &str) -> String;

    /// Apply one `name=value; attr=...` assignment
    fn set_cookie(&mut self, assignment: &str) -> Result<(), StorageError>;
}

/// In-memory cookie jar
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Vec<StoredCookie>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every cookie currently held, expired ones included
    pub fn cookies(&self) -> &[StoredCookie] {
        &self.cookies
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl CookieJar for MemoryCookieJar {
    fn cookie_string(&self, path: &str) -> String {
        let now = Utc::now();
        let mut visible: Vec<&StoredCookie> = self
            .cookies
            .iter()
            .filter(|c| !c.is_expired(now) && path_matches(&c.path, path))
            .collect();

        // Longer paths first, then insertion order
        visible.sort_by(|a, b| b.path.len().cmp(&a.path.len()));

        visible
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn set_cookie(&mut self, assignment: &str) -> Result<(), StorageError> {
        self.store(assignment, Utc::now())
    }
}

impl MemoryCookieJar {
    /// Apply an assignment as of `now`, dropping every cookie expired by then
    fn store(&mut self, assignment: &str, now: DateTime<Utc>) -> Result<(), StorageError> {
        let cookie = parse_assignment(assignment, now)?;

        self.cookies
            .retain(|existing| !existing.is_expired(now) && !existing.same_slot(&cookie));
        if !cookie.is_expired(now) {
            self.cookies.push(cookie);
        }
        Ok(())
    }
}

/// Parse a `name=value; path=/; expires=...` assignment
fn parse_assignment(assignment: &str, now: DateTime<Utc>) -> Result<StoredCookie, StorageError> {
    let mut parts = assignment.split(';');

    let pair = parts.next().unwrap_or_default();
    let (name, value) = pair
        .split_once('=')
        .ok_or_else(|| StorageError::Corrupt(format!("cookie without '=': {}", pair)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(StorageError::Corrupt("cookie without a name".to_string()));
    }

    let mut cookie = StoredCookie {
        name: name.to_string(),
        value: value.trim().to_string(),
        path: "/".to_string(),
        domain: None,
        expires: None,
        same_site: None,
        secure: false,
    };
    let mut max_age = None;

    for attribute in parts {
        let (key, val) = match attribute.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (attribute.trim(), ""),
        };

        match key.to_ascii_lowercase().as_str() {
            "path" if val.starts_with('/') => cookie.path = val.to_string(),
            "domain" if !val.is_empty() => cookie.domain = Some(val.to_string()),
            "expires" => cookie.expires = parse_absolute(val),
            "max-age" => max_age = val.parse::<i64>().ok(),
            "samesite" => cookie.same_site = Some(val.to_string()),
            "secure" => cookie.secure = true,
            _ => {}
        }
    }

    // max-age wins over expires
    if let Some(seconds) = max_age {
        cookie.expires = if seconds <= 0 {
            DateTime::<Utc>::from_timestamp(0, 0)
        } else {
            Duration::try_seconds(seconds).and_then(|d| now.checked_add_signed(d))
        };
    }

    Ok(cookie)
}

/// RFC 6265 path-match
fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

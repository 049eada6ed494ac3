//! Cookie backend
//!
//! Expiration and path are native cookie attributes here, so there is no
//! metadata dictionary. Values are percent-encoded on the way in.

use super::{describe, Backend, BackendKind, ListEntry};
use crate::codec::{self, Value};
use crate::config::SetOptions;
use crate::expires::{http_date, Expires};
use crate::storage::{lock, JarHandle, Location};
use chrono::Utc;
use std::io::{self, Write};
use tracing::{debug, warn};

/// Expiry written to delete a cookie
pub const COOKIE_EPOCH: &str = "1970-01-01T00:00:01Z";

/// Backend over the cookie jar
pub struct CookieBackend {
    jar: JarHandle,
    location: Location,
}

impl CookieBackend {
    pub fn new(jar: JarHandle, location: Location) -> Self {
        CookieBackend { jar, location }
    }

    /// Build the `name=value; attr=...` assignment for a write
    pub fn assignment(key: &str, value: &Value, options: &SetOptions) -> String {
        let mut cookie = format!("{}={}", key, urlencoding::encode(&codec::encode(value)));

        if let Some(path) = options.scoped_path() {
            cookie.push_str(&format!("; path={}", path));
        }
        if let Some(domain) = options.scoped_domain() {
            cookie.push_str(&format!("; domain={}", domain));
        }
        if let Some(max_age) = options.max_age {
            cookie.push_str(&format!("; max-age={}", max_age));
        }
        if let Some(expires) = options.expiry() {
            match expires.resolve(Utc::now()) {
                Some(at) => cookie.push_str(&format!("; expires={}", http_date(at))),
                None => warn!("Ignoring unparseable expiration {:?} for cookie '{}'", expires, key),
            }
        }
        if let Some(same_site) = options.same_site {
            cookie.push_str(&format!("; SameSite={}", same_site));
        }
        if options.requires_secure() {
            cookie.push_str("; secure");
        }

        cookie
    }

    /// Remove a cookie written with a specific path or domain
    pub fn remove_with(&self, key: &str, options: &SetOptions) {
        let expired = SetOptions {
            expires: Some(Expires::from(COOKIE_EPOCH)),
            max_age: None,
            ..options.clone()
        };
        self.set(key, &Value::text(""), &expired);
    }

    /// Read a cookie, then remove it with the given path or domain
    pub fn get_and_remove_with(&self, key: &str, options: &SetOptions) -> Option<Value> {
        let value = self.get(key, None);
        self.remove_with(key, options);
        value
    }

    /// `(name, raw value)` pairs visible from the current path
    fn pairs(&self) -> Vec<(String, String)> {
        let path = self.location.path();
        let cookies = lock(&self.jar).cookie_string(&path);

        cookies
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect()
    }
}

/// Undo percent-encoding; a malformed sequence keeps the raw text
fn unescape(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!("Keeping cookie value as written: {}", e);
            raw.to_string()
        }
    }
}

impl Backend for CookieBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cookie
    }

    fn set(&self, key: &str, value: &Value, options: &SetOptions) {
        if key.is_empty() {
            warn!("Vault: set was called with no key.");
            return;
        }

        let cookie = Self::assignment(key, value, options);
        debug!("Setting cookie: {}", cookie);

        if let Err(e) = lock(&self.jar).set_cookie(&cookie) {
            warn!("Vault: could not write cookie '{}': {}", key, e);
        }
    }

    fn get(&self, key: &str, default: Option<Value>) -> Option<Value> {
        let raw = self
            .pairs()
            .into_iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value);

        // Only absence yields the default; an empty cookie is empty text
        match raw {
            Some(raw) => codec::decode(&unescape(&raw)),
            None => default,
        }
    }

    fn remove(&self, key: &str) {
        self.remove_with(key, &SetOptions::new());
    }

    fn clear(&self) {
        for (name, _) in self.pairs() {
            self.remove(&name);
        }
    }

    fn list(&self, raw: bool, out: &mut dyn Write) -> io::Result<()> {
        let pairs = self.pairs();
        if pairs.is_empty() {
            return writeln!(out, "0 cookies");
        }

        for (name, value) in pairs {
            if raw {
                writeln!(out, "{} = {}", name, value)?;
            } else {
                let decoded = codec::decode(&unescape(&value));
                writeln!(out, "{} = {}", name, describe(decoded.as_ref()))?;
            }
        }
        Ok(())
    }

    fn get_list(&self) -> Vec<ListEntry> {
        self.pairs()
            .into_iter()
            .map(|(name, _)| {
                let value = self.get(&name, None);
                ListEntry::new(name, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SameSite;
    use crate::storage::{jar_handle, CookieJar, MemoryCookieJar, StorageError};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Jar that records every assignment before applying it
    struct RecordingJar {
        inner: MemoryCookieJar,
        written: Arc<Mutex<Vec<String>>>,
    }

    impl CookieJar for RecordingJar {
        fn cookie_string(&self, path: &str) -> String {
            self.inner.cookie_string(path)
        }

        fn set_cookie(&mut self, assignment: &str) -> Result<(), StorageError> {
            self.written.lock().unwrap().push(assignment.to_string());
            self.inner.set_cookie(assignment)
        }
    }

    fn recording() -> (CookieBackend, Arc<Mutex<Vec<String>>>, Location) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let jar = RecordingJar {
            inner: MemoryCookieJar::new(),
            written: Arc::clone(&written),
        };
        let location = Location::default();
        let backend = CookieBackend::new(jar_handle(jar), location.clone());
        (backend, written, location)
    }

    #[test]
    fn test_set_get_coercion() {
        let (backend, _, _) = recording();
        let none = SetOptions::new();

        backend.set("theme", &Value::text("dark"), &none);
        backend.set("count", &Value::from(5), &none);
        backend.set("flag", &Value::Bool(false), &none);
        backend.set("obj", &Value::Structured(json!({"a": "b; c=d"})), &none);

        assert_eq!(backend.get("theme", None), Some(Value::text("dark")));
        assert_eq!(backend.get("count", None), Some(Value::Number(5.0)));
        assert_eq!(backend.get("flag", None), Some(Value::Bool(false)));
        assert_eq!(
            backend.get("obj", None),
            Some(Value::Structured(json!({"a": "b; c=d"})))
        );
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let (backend, written, _) = recording();
        backend.set("msg", &Value::text("a b;c"), &SetOptions::new());

        assert_eq!(written.lock().unwrap()[0], "msg=a%20b%3Bc");
        assert_eq!(backend.get("msg", None), Some(Value::text("a b;c")));
    }

    #[test]
    fn test_assignment_attributes() {
        let options = SetOptions::new()
            .with_path("/app")
            .with_domain("example.com")
            .with_max_age(60)
            .with_expires(Expires::Millis(1000))
            .with_same_site(SameSite::None);

        assert_eq!(
            CookieBackend::assignment("id", &Value::from(7), &options),
            "id=7; path=/app; domain=example.com; max-age=60; \
             expires=Thu, 01 Jan 1970 00:00:01 GMT; SameSite=None; secure"
        );

        let lax = SetOptions::new().with_same_site(SameSite::Lax);
        assert_eq!(
            CookieBackend::assignment("id", &Value::from(7), &lax),
            "id=7; SameSite=Lax"
        );
    }

    #[test]
    fn test_remove_writes_past_expiry() {
        let (backend, written, _) = recording();
        backend.set("session", &Value::text("abc"), &SetOptions::new());
        backend.remove("session");

        let removal = written.lock().unwrap()[1].clone();
        assert_eq!(removal, "session=; expires=Thu, 01 Jan 1970 00:00:01 GMT");
        assert_eq!(
            backend.get("session", Some(Value::text("default"))),
            Some(Value::text("default"))
        );
    }

    #[test]
    fn test_remove_with_path() {
        let (backend, written, location) = recording();
        location.navigate("/admin");

        let scoped = SetOptions::new().with_path("/admin").with_max_age(3600);
        backend.set("panel", &Value::text("open"), &scoped);

        // Removal at the default path misses the scoped cookie
        backend.remove("panel");
        assert_eq!(backend.get("panel", None), Some(Value::text("open")));

        assert_eq!(backend.get_and_remove_with("panel", &scoped), Some(Value::text("open")));
        assert_eq!(backend.get("panel", None), None);

        let removal = written.lock().unwrap().last().cloned().unwrap();
        assert_eq!(
            removal,
            "panel=; path=/admin; expires=Thu, 01 Jan 1970 00:00:01 GMT"
        );
    }

    #[test]
    fn test_path_is_native() {
        let (backend, _, location) = recording();
        backend.set("panel", &Value::text("open"), &SetOptions::new().with_path("/admin"));

        location.navigate("/public");
        assert_eq!(backend.get("panel", None), None);

        location.navigate("/admin/users");
        assert_eq!(backend.get("panel", None), Some(Value::text("open")));
    }

    #[test]
    fn test_expired_cookie_reads_default() {
        let (backend, _, _) = recording();
        backend.set("old", &Value::text("x"), &SetOptions::new().with_expires("-1 days"));
        assert_eq!(backend.get("old", None), None);
    }

    #[test]
    fn test_empty_value_is_present() {
        let (backend, _, _) = recording();
        backend.set("blank", &Value::text(""), &SetOptions::new());

        assert_eq!(
            backend.get("blank", Some(Value::text("default"))),
            Some(Value::text(""))
        );
        assert_eq!(
            backend.get("missing", Some(Value::text("default"))),
            Some(Value::text("default"))
        );
    }

    #[test]
    fn test_malformed_escape_kept_raw() {
        let jar = jar_handle(MemoryCookieJar::new());
        lock(&jar).set_cookie("bad=%E0%A4%A").unwrap();

        let backend = CookieBackend::new(jar, Location::default());
        assert_eq!(backend.get("bad", None), Some(Value::text("%E0%A4%A")));
    }

    #[test]
    fn test_set_without_key() {
        let (backend, written, _) = recording();
        backend.set("", &Value::text("x"), &SetOptions::new());
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_and_get_list() {
        let (backend, _, _) = recording();
        backend.set("a", &Value::from(1), &SetOptions::new());
        backend.set("b", &Value::text("two"), &SetOptions::new());

        assert_eq!(
            backend.get_list(),
            vec![
                ListEntry::new("a", Some(Value::Number(1.0))),
                ListEntry::new("b", Some(Value::text("two"))),
            ]
        );

        backend.clear();
        assert!(backend.get_list().is_empty());
    }

    #[test]
    fn test_list_output() {
        let (backend, _, _) = recording();
        let mut out = Vec::new();
        backend.list(false, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 cookies\n");

        backend.set("msg", &Value::text("a b"), &SetOptions::new());

        let mut out = Vec::new();
        backend.list(false, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "msg = \"a b\"\n");

        let mut out = Vec::new();
        backend.list(true, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "msg = a%20b\n");
    }
}

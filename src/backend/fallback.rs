//! Stand-in for an unavailable storage mechanism

use super::{Backend, BackendKind, CookieBackend, ListEntry};
use crate::codec::Value;
use crate::config::SetOptions;
use std::io::{self, Write};
use std::sync::Arc;

/// Fills a session or durable role with the cookie backend
///
/// Every operation is forwarded; the role is kept so listings and logs
/// still say which backend the caller asked for.
pub struct CookieFallback {
    role: BackendKind,
    cookie: Arc<CookieBackend>,
}

impl CookieFallback {
    pub fn new(role: BackendKind, cookie: Arc<CookieBackend>) -> Self {
        CookieFallback { role, cookie }
    }
}

impl Backend for CookieFallback {
    fn kind(&self) -> BackendKind {
        self.role
    }

    fn is_fallback(&self) -> bool {
        true
    }

    fn set(&self, key: &str, value: &Value, options: &SetOptions) {
        self.cookie.set(key, value, options)
    }

    fn get(&self, key: &str, default: Option<Value>) -> Option<Value> {
        self.cookie.get(key, default)
    }

    fn get_and_remove(&self, key: &str) -> Option<Value> {
        self.cookie.get_and_remove(key)
    }

    fn remove(&self, key: &str) {
        self.cookie.remove(key)
    }

    fn clear(&self) {
        self.cookie.clear()
    }

    fn list(&self, raw: bool, out: &mut dyn Write) -> io::Result<()> {
        self.cookie.list(raw, out)
    }

    fn get_list(&self) -> Vec<ListEntry> {
        self.cookie.get_list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{jar_handle, Location, MemoryCookieJar};

    #[test]
    fn test_forwards_to_cookies() {
        let cookie = Arc::new(CookieBackend::new(
            jar_handle(MemoryCookieJar::new()),
            Location::default(),
        ));
        let fallback = CookieFallback::new(BackendKind::Session, Arc::clone(&cookie));

        fallback.set("theme", &Value::text("dark"), &SetOptions::new());
        assert_eq!(cookie.get("theme", None), Some(Value::text("dark")));
        assert_eq!(fallback.get("theme", None), Some(Value::text("dark")));

        assert_eq!(fallback.get_and_remove("theme"), Some(Value::text("dark")));
        assert_eq!(cookie.get("theme", None), None);

        assert_eq!(fallback.kind(), BackendKind::Session);
        assert!(fallback.is_fallback());
    }
}

//! Current page location

use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to the current page path
///
/// Path-scoped entries and cookies are resolved against it at read time.
#[derive(Debug, Clone)]
pub struct Location {
    path: Arc<RwLock<String>>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Location {
            path: Arc::new(RwLock::new(path.into())),
        }
    }

    /// The current path
    pub fn path(&self) -> String {
        self.path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Move to another path; every clone of this handle sees the change
    pub fn navigate(&self, path: impl Into<String>) {
        *self.path.write().unwrap_or_else(PoisonError::into_inner) = path.into();
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::new("/")
    }
}

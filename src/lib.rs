//! VaultStore - one get/set contract over session, durable and cookie storage
//!
//! Modules, leaves first:
//! - `codec` and `expires` turn values and expiration directives into strings and instants
//! - `storage` holds the mechanisms themselves, handed around as shared handles
//! - `meta` keeps per-key expiration and path scope next to the values
//! - `backend` implements the common contract once per mechanism
//! - `vault` routes writes and falls back across backends on reads
//! - `shell` is the line-oriented inspection interface used by the binary

pub mod codec;
pub mod expires;
pub mod config;
pub mod storage;
pub mod meta;
pub mod backend;
pub mod vault;
pub mod shell;

/// Re-export commonly used types
pub use backend::{Backend, BackendKind, CookieBackend, ListEntry};
pub use codec::Value;
pub use config::{SameSite, SetOptions, VaultConfig};
pub use expires::Expires;
pub use storage::{Environment, Location, StorageError};
pub use vault::{Vault, VaultLists};

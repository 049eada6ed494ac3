//! Inspection shell
//!
//! A line-oriented command interface over a `Vault`, used by the binary.
//! Each command is a `Command` trait object looked up in a registry.

mod commands;
mod dispatch;
mod registry;

pub use dispatch::{tokenize, Shell};
pub use registry::CommandRegistry;

use crate::backend::{describe, BackendKind};
use crate::codec::Value;
use crate::config::{SameSite, SetOptions};
use crate::vault::Vault;
use std::fmt;

/// Command execution trait
pub trait Command: Send + Sync {
    /// Execute with the arguments that follow the command name
    fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> Reply;

    /// Command name, matched case-insensitively
    fn name(&self) -> &'static str;

    fn min_args(&self) -> usize {
        0
    }

    /// `None` = unlimited
    fn max_args(&self) -> Option<usize> {
        None
    }
}

/// What a command runs against
pub struct CommandContext<'a> {
    pub vault: &'a Vault,

    /// Backend named by a leading scope word; `None` goes through the facade
    pub scope: Option<BackendKind>,
}

/// Result of one command line
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    Value(Option<Value>),
    Text(String),
    Error(String),
}

impl Reply {
    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Value(value) => f.write_str(&describe(value.as_ref())),
            Reply::Text(text) => f.write_str(text),
            Reply::Error(msg) => write!(f, "ERR {}", msg),
        }
    }
}

/// Parse a scope word
pub(crate) fn parse_scope(word: &str) -> Option<BackendKind> {
    match word.to_ascii_lowercase().as_str() {
        "session" => Some(BackendKind::Session),
        "local" => Some(BackendKind::Durable),
        "cookie" | "cookies" => Some(BackendKind::Cookie),
        _ => None,
    }
}

/// Parse `name=value` options and the bare `secure` flag
pub(crate) fn parse_options(args: &[String]) -> Result<SetOptions, String> {
    let mut options = SetOptions::new();

    for arg in args {
        let (name, value) = arg.split_once('=').unwrap_or((arg.as_str(), ""));

        match name.to_ascii_lowercase().as_str() {
            "expires" => options = options.with_expires(value),
            "path" => options = options.with_path(value),
            "domain" => options = options.with_domain(value),
            "max_age" | "max-age" | "maxage" => {
                let seconds = value
                    .parse::<i64>()
                    .map_err(|_| format!("invalid max_age '{}'", value))?;
                options = options.with_max_age(seconds);
            }
            "samesite" => options = options.with_same_site(value.parse::<SameSite>()?),
            "secure" => options = options.secure(),
            _ => return Err(format!("unknown option '{}'", arg)),
        }
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expires::Expires;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        let options = parse_options(&args(&[
            "expires=+1 hour",
            "path=/admin",
            "domain=example.com",
            "max_age=60",
            "samesite=none",
            "secure",
        ]))
        .unwrap();

        assert_eq!(options.expiry(), Some(&Expires::from("+1 hour")));
        assert_eq!(options.scoped_path(), Some("/admin"));
        assert_eq!(options.scoped_domain(), Some("example.com"));
        assert_eq!(options.max_age, Some(60));
        assert_eq!(options.same_site, Some(SameSite::None));
        assert!(options.secure);
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(parse_options(&args(&["max_age=soon"])).is_err());
        assert!(parse_options(&args(&["samesite=maybe"])).is_err());
        assert!(parse_options(&args(&["colour=blue"])).is_err());
    }

    #[test]
    fn test_parse_scope() {
        assert_eq!(parse_scope("SESSION"), Some(BackendKind::Session));
        assert_eq!(parse_scope("local"), Some(BackendKind::Durable));
        assert_eq!(parse_scope("Cookie"), Some(BackendKind::Cookie));
        assert_eq!(parse_scope("get"), None);
    }

    #[test]
    fn test_reply_display() {
        assert_eq!(Reply::Ok.to_string(), "OK");
        assert_eq!(Reply::Value(None).to_string(), "undefined");
        assert_eq!(Reply::Value(Some(Value::text("dark"))).to_string(), "\"dark\"");
        assert_eq!(Reply::error("boom").to_string(), "ERR boom");
    }
}

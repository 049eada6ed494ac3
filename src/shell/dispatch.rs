//! Shell dispatcher
//!
//! Splits a line into tokens, strips an optional scope word, validates the
//! argument count and routes to the command.

use super::{parse_scope, CommandContext, CommandRegistry, Reply};
use crate::vault::Vault;
use tracing::{debug, warn};

/// Line-oriented shell over one vault
pub struct Shell {
    registry: CommandRegistry,
    vault: Vault,
}

impl Shell {
    pub fn new(vault: Vault) -> Self {
        Shell {
            registry: CommandRegistry::new(),
            vault,
        }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Run one line; `None` for a blank line
    pub fn execute_line(&self, line: &str) -> Option<Reply> {
        let tokens = match tokenize(line) {
            Ok(tokens) if tokens.is_empty() => return None,
            Ok(tokens) => tokens,
            Err(e) => return Some(Reply::error(e)),
        };

        // A leading scope word only counts when a command follows it
        let (scope, tokens) = match parse_scope(&tokens[0]) {
            Some(kind) if tokens.len() > 1 => (Some(kind), &tokens[1..]),
            _ => (None, &tokens[..]),
        };

        let cmd_name = &tokens[0];
        debug!("Dispatching command: {} (scope: {:?})", cmd_name, scope);

        let command = match self.registry.get(cmd_name) {
            Some(cmd) => cmd,
            None => {
                warn!("Unknown command: {}", cmd_name);
                return Some(Reply::error(format!("unknown command '{}'", cmd_name)));
            }
        };

        let args = &tokens[1..];
        let too_many = command.max_args().is_some_and(|max| args.len() > max);
        if args.len() < command.min_args() || too_many {
            return Some(Reply::error(format!(
                "wrong number of arguments for '{}' command",
                command.name()
            )));
        }

        let ctx = CommandContext {
            vault: &self.vault,
            scope,
        };
        Some(command.execute(&ctx, args))
    }
}

/// Split a line on whitespace, keeping double-quoted runs together
///
/// Quotes may appear inside a token (`expires="+1 hour"`); `\"` and `\\`
/// escape inside quotes.
pub fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            '\\' if in_quotes => match chars.next() {
                Some(escaped @ ('"' | '\\')) => current.push(escaped),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

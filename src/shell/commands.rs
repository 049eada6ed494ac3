//! Shell commands

use super::{parse_options, Command, CommandContext, Reply};
use crate::backend::BackendKind;
use crate::codec;

/// SET key value [option...]
///
/// The value is typed the way it would read back: `5` is a number, `true`
/// a boolean, `{"a":1}` an object.
pub struct SetCommand;

impl Command for SetCommand {
    fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> Reply {
        let value = match codec::decode(&args[1]) {
            Some(value) => value,
            None => return Reply::error("cannot store undefined"),
        };
        let options = match parse_options(&args[2..]) {
            Ok(options) => options,
            Err(e) => return Reply::error(e),
        };

        match ctx.scope {
            Some(kind) => ctx.vault.backend(kind).set(&args[0], &value, &options),
            None => ctx.vault.set(&args[0], &value, &options),
        }
        Reply::Ok
    }

    fn name(&self) -> &'static str {
        "SET"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// GET key
pub struct GetCommand;

impl Command for GetCommand {
    fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> Reply {
        let value = match ctx.scope {
            Some(kind) => ctx.vault.backend(kind).get(&args[0], None),
            None => ctx.vault.get(&args[0], None),
        };
        Reply::Value(value)
    }

    fn name(&self) -> &'static str {
        "GET"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// GETDEL key
pub struct GetDelCommand;

impl Command for GetDelCommand {
    fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> Reply {
        let value = match ctx.scope {
            Some(kind) => ctx.vault.backend(kind).get_and_remove(&args[0]),
            None => ctx.vault.get_and_remove(&args[0]),
        };
        Reply::Value(value)
    }

    fn name(&self) -> &'static str {
        "GETDEL"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// DEL key [path=..] [domain=..]
///
/// Path and domain only make sense for cookies, where they select which
/// cookie to delete.
pub struct DelCommand;

impl Command for DelCommand {
    fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> Reply {
        let key = &args[0];

        if args.len() > 1 {
            if ctx.scope != Some(BackendKind::Cookie) {
                return Reply::error("DEL options only apply to cookies");
            }
            let options = match parse_options(&args[1..]) {
                Ok(options) => options,
                Err(e) => return Reply::error(e),
            };
            ctx.vault.cookie().remove_with(key, &options);
            return Reply::Ok;
        }

        match ctx.scope {
            Some(kind) => ctx.vault.backend(kind).remove(key),
            None => ctx.vault.remove(key),
        }
        Reply::Ok
    }

    fn name(&self) -> &'static str {
        "DEL"
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// CLEAR
pub struct ClearCommand;

impl Command for ClearCommand {
    fn execute(&self, ctx: &CommandContext<'_>, _args: &[String]) -> Reply {
        match ctx.scope {
            Some(kind) => ctx.vault.backend(kind).clear(),
            None => ctx.vault.clear(),
        }
        Reply::Ok
    }

    fn name(&self) -> &'static str {
        "CLEAR"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

/// LIST [raw]
pub struct ListCommand;

impl Command for ListCommand {
    fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> Reply {
        let raw = match args.first().map(|a| a.to_ascii_lowercase()) {
            None => false,
            Some(flag) if flag == "raw" => true,
            Some(flag) => return Reply::error(format!("unknown LIST flag '{}'", flag)),
        };

        let mut out = Vec::new();
        let written = match ctx.scope {
            Some(kind) => ctx.vault.backend(kind).list(raw, &mut out),
            None => ctx.vault.list(raw, &mut out),
        };
        if let Err(e) = written {
            return Reply::error(e.to_string());
        }

        let text = String::from_utf8_lossy(&out);
        Reply::Text(text.trim_end().to_string())
    }

    fn name(&self) -> &'static str {
        "LIST"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// LISTS: every backend as JSON
pub struct ListsCommand;

impl Command for ListsCommand {
    fn execute(&self, ctx: &CommandContext<'_>, _args: &[String]) -> Reply {
        let json = match ctx.scope {
            Some(kind) => serde_json::to_string_pretty(&ctx.vault.backend(kind).get_list()),
            None => serde_json::to_string_pretty(&ctx.vault.get_lists()),
        };

        match json {
            Ok(text) => Reply::Text(text),
            Err(e) => Reply::error(e.to_string()),
        }
    }

    fn name(&self) -> &'static str {
        "LISTS"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

/// CD path
pub struct CdCommand;

impl Command for CdCommand {
    fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> Reply {
        if !args[0].starts_with('/') {
            return Reply::error("path must start with '/'");
        }
        ctx.vault.location().navigate(args[0].clone());
        Reply::Ok
    }

    fn name(&self) -> &'static str {
        "CD"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// PWD
pub struct PwdCommand;

impl Command for PwdCommand {
    fn execute(&self, ctx: &CommandContext<'_>, _args: &[String]) -> Reply {
        Reply::Text(ctx.vault.location().path())
    }

    fn name(&self) -> &'static str {
        "PWD"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

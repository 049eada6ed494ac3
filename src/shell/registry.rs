//! Command registry

use super::commands::{
    CdCommand, ClearCommand, DelCommand, GetCommand, GetDelCommand, ListCommand, ListsCommand,
    PwdCommand, SetCommand,
};
use super::Command;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all shell commands
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry holding every command
    pub fn new() -> Self {
        let mut registry = CommandRegistry {
            commands: HashMap::new(),
        };

        // Entries
        registry.register(Arc::new(SetCommand));
        registry.register(Arc::new(GetCommand));
        registry.register(Arc::new(GetDelCommand));
        registry.register(Arc::new(DelCommand));
        registry.register(Arc::new(ClearCommand));

        // Inspection
        registry.register(Arc::new(ListCommand));
        registry.register(Arc::new(ListsCommand));

        // Location
        registry.register(Arc::new(CdCommand));
        registry.register(Arc::new(PwdCommand));

        registry
    }

    fn register(&mut self, command: Arc<dyn Command>) {
        let name = command.name().to_uppercase();
        self.commands.insert(name, command);
    }

    /// Get a command by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(&name.to_uppercase()).cloned()
    }

    /// All command names, sorted
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.get("getdel").map(|c| c.name()), Some("GETDEL"));
        assert!(registry.get("Lists").is_some());
        assert!(registry.get("INCR").is_none());
    }

    #[test]
    fn test_command_names() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.command_names(),
            vec!["CD", "CLEAR", "DEL", "GET", "GETDEL", "LIST", "LISTS", "PWD", "SET"]
        );
    }
}

//! Command registry and name resolution.
//!
//! Provides a `CommandRegistry` struct that holds every command in
//! declaration order and resolves abbreviated names typed by the user. This
//! uses constructor injection rather than global state.

use crate::command::Command;
use ecat_common::od::types::DataType;
use std::fmt::Write as _;
use thiserror::Error;

/// Name resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No command matches.
    #[error("Unknown command {0}!")]
    Unknown(String),

    /// More than one command matches.
    #[error("Ambiguous command abbreviation! Matching:\n{}", .matches.join("\n"))]
    Ambiguous {
        /// Token as typed.
        token: String,
        /// Names of the matching commands, in registry order.
        matches: Vec<&'static str>,
    },
}

/// Registry of available commands.
///
/// Constructed at startup, populated via `register()`, immutable afterwards.
/// Iteration order is declaration order and is used both for the usage table
/// and for listing ambiguous matches.
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a command.
    ///
    /// # Panics
    /// Panics if a command with the same name is already registered.
    pub fn register(&mut self, command: Box<dyn Command>) {
        let name = command.name();
        if self.get(name).is_some() {
            panic!("Command '{name}' is already registered");
        }
        self.commands.push(command);
    }

    /// Get a command by exact name.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    /// Resolve a user token to its candidate commands.
    ///
    /// Commands whose name starts with `token` win. Only if there is none,
    /// commands whose name contains the token's characters in order are
    /// returned. The result is in registry order; an empty token matches
    /// nothing.
    pub fn resolve(&self, token: &str) -> Vec<&dyn Command> {
        let by_prefix: Vec<&dyn Command> = self
            .iter()
            .filter(|c| c.matches_prefix(token))
            .collect();
        if !by_prefix.is_empty() {
            return by_prefix;
        }
        self.iter().filter(|c| c.matches_abbrev(token)).collect()
    }

    /// Resolve a user token to exactly one command.
    ///
    /// # Errors
    /// `ResolutionError::Unknown` for zero matches,
    /// `ResolutionError::Ambiguous` (listing every match) for several.
    pub fn resolve_one(&self, token: &str) -> Result<&dyn Command, ResolutionError> {
        let mut matches = self.resolve(token);
        match matches.len() {
            0 => Err(ResolutionError::Unknown(token.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(ResolutionError::Ambiguous {
                token: token.to_string(),
                matches: matches.iter().map(|c| c.name()).collect(),
            }),
        }
    }

    /// Registered commands in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.iter().map(|c| c.as_ref())
    }

    /// List all registered command names.
    pub fn list_commands(&self) -> Vec<&'static str> {
        self.iter().map(|c| c.name()).collect()
    }

    /// Full usage text of the tool.
    pub fn usage(&self, binary: &str) -> String {
        let width = self.iter().map(|c| c.name().len()).max().unwrap_or(0);
        let mut s = String::new();

        let _ = writeln!(s, "Usage: {binary} <COMMAND> [OPTIONS] [ARGUMENTS]");
        let _ = writeln!(s);
        let _ = writeln!(s, "Commands (can be abbreviated):");
        for command in self.iter() {
            let _ = writeln!(s, "  {:<width$}  {}", command.name(), command.brief());
        }
        let _ = writeln!(s);
        s.push_str(GLOBAL_OPTIONS);
        let _ = writeln!(s);
        s.push_str(&numeric_info());
        let _ = writeln!(s);
        let _ = writeln!(
            s,
            "Call '{binary} <COMMAND> --help' for command-specific help."
        );
        s
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

const GLOBAL_OPTIONS: &str = "\
Global options:
  --master      -m <master>  Comma separated list of masters
                             to select, ranges are allowed.
                             Examples: '1,3', '5-7,9', '-3'.
                             Default: '-' (all).
  --alias       -a <alias>   Slave alias selector. Default: '-'.
  --position    -p <pos>     Slave position selector. Default: '-'.
  --domain      -d <domain>  Domain selector. Default: '-'.
  --type        -t <type>    Data type of dictionary accesses.
  --output-file -o <file>    Write machine-readable output to <file>.
  --skin        -s <skin>    Output skin.
  --config         <file>    Tool configuration (TOML).
  --force       -f           Force a command.
  --quiet       -q           Output less information.
  --verbose     -v           Output more information.
  --help        -h           Show this help.
";

/// Note on numeric argument formats, shared by usage and command help.
pub fn numeric_info() -> String {
    let types: Vec<&str> = DataType::ALL.iter().map(|t| t.name()).collect();
    format!(
        "Numerical values can be specified either with decimal (no\n\
         prefix), octal (prefix '0') or hexadecimal (prefix '0x') base.\n\
         Supported data types: {}.\n",
        types.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandEnv, CommandError, CommandOutput};
    use crate::context::ExecutionContext;

    struct TestCommand(&'static str);

    impl Command for TestCommand {
        fn name(&self) -> &'static str {
            self.0
        }

        fn brief(&self) -> &'static str {
            "Test command"
        }

        fn execute(
            &self,
            _args: &[String],
            _ctx: &ExecutionContext,
            _env: &mut CommandEnv<'_>,
        ) -> Result<CommandOutput, CommandError> {
            Ok(CommandOutput::None)
        }
    }

    fn registry(names: &[&'static str]) -> CommandRegistry {
        let mut reg = CommandRegistry::new();
        for name in names {
            reg.register(Box::new(TestCommand(*name)));
        }
        reg
    }

    fn names(found: Vec<&dyn Command>) -> Vec<&'static str> {
        found.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn prefix_match_resolves_single_command() {
        let reg = registry(&["alias", "download", "slaves", "upload"]);
        assert_eq!(reg.resolve_one("down").unwrap().name(), "download");
        assert_eq!(reg.resolve_one("upload").unwrap().name(), "upload");
    }

    #[test]
    fn ambiguous_prefix_lists_in_registry_order() {
        let reg = registry(&["sleep", "download", "slaves"]);
        assert_eq!(names(reg.resolve("sl")), vec!["sleep", "slaves"]);

        let err = reg.resolve_one("sl").err().unwrap();
        assert_eq!(
            err,
            ResolutionError::Ambiguous {
                token: "sl".to_string(),
                matches: vec!["sleep", "slaves"],
            }
        );
        assert!(err.to_string().ends_with("sleep\nslaves"));
    }

    #[test]
    fn prefix_match_suppresses_abbreviation_phase() {
        // "dl" is also a subsequence of "download"; only the prefix match counts.
        let reg = registry(&["download", "dlx"]);
        assert_eq!(names(reg.resolve("dl")), vec!["dlx"]);
    }

    #[test]
    fn abbreviation_used_when_no_prefix_matches() {
        let reg = registry(&["download", "states", "upload"]);
        assert_eq!(names(reg.resolve("dl")), vec!["download"]);
        assert_eq!(names(reg.resolve("ld")), vec!["download", "upload"]);
    }

    #[test]
    fn unknown_token_yields_nothing() {
        let reg = registry(&["download", "upload"]);
        assert!(reg.resolve("xyz").is_empty());
        assert_eq!(
            reg.resolve_one("xyz").err().unwrap(),
            ResolutionError::Unknown("xyz".to_string())
        );
        assert!(reg.resolve("").is_empty());
    }

    #[test]
    fn resolution_is_repeatable() {
        let reg = registry(&["download", "dump", "upload"]);
        let first = names(reg.resolve("d"));
        for _ in 0..10 {
            assert_eq!(names(reg.resolve("d")), first);
        }
        assert_eq!(first, vec!["download", "dump"]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let reg = registry(&["download"]);
        assert!(reg.resolve("Down").is_empty());
    }

    #[test]
    fn usage_lists_commands_aligned() {
        let reg = registry(&["download", "up"]);
        let usage = reg.usage("ecat_tool");
        assert!(usage.starts_with("Usage: ecat_tool <COMMAND> [OPTIONS] [ARGUMENTS]"));
        assert!(usage.contains("  download  Test command\n"));
        assert!(usage.contains("  up        Test command\n"));
        assert!(usage.contains("--master"));
        assert!(usage.contains("hexadecimal (prefix '0x')"));
    }

    #[test]
    fn list_commands_keeps_declaration_order() {
        let reg = registry(&["upload", "alias", "download"]);
        assert_eq!(reg.list_commands(), vec!["upload", "alias", "download"]);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = CommandRegistry::new();
        reg.register(Box::new(TestCommand("dup")));
        reg.register(Box::new(TestCommand("dup")));
    }
}

//! Command trait and error types.
//!
//! This module defines:
//! - `Command` trait - Interface for every operation the tool can resolve
//! - `CommandError` enum - Usage, command and device failures
//! - `CommandOutput` enum - What a successful command produced
//! - `CommandEnv` struct - Collaborators handed to a running command

use crate::command_registry::CommandRegistry;
use crate::context::ExecutionContext;
use crate::sequencer::{SequenceError, SequenceReport};
use ecat_common::config::SequencerConfig;
use ecat_common::drive::state::PowerState;
use ecat_common::od::client::{DictionaryClient, OdError};
use ecat_common::od::types::{DictionaryAddress, decode_value, format_padded};
use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Error types for command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Malformed arguments; the caller shows the command's help text.
    #[error("{0}")]
    Usage(String),

    /// Command could not be carried out.
    #[error("{0}")]
    Failed(String),

    /// Dictionary client failure.
    #[error(transparent)]
    Device(#[from] OdError),

    /// Drive sequence failure.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Console or output file failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Whether the caller should print the command's help text.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Nothing to print.
    None,
    /// Value read from the dictionary.
    Value {
        /// Entry that was read.
        address: DictionaryAddress,
        /// Raw value.
        raw: u64,
    },
    /// Decoded status word.
    Status {
        /// Raw status word.
        raw: u16,
        /// Decoded power state.
        state: PowerState,
    },
    /// Drive sequence report.
    Report(SequenceReport),
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Value { address, raw } => write!(
                f,
                "{} {}",
                format_padded(*raw, address.data_type),
                decode_value(*raw, address.data_type)
            ),
            Self::Status { raw, state } => write!(f, "{raw:#06x} {state}"),
            Self::Report(report) => write!(f, "{report}"),
        }
    }
}

/// Collaborators available to a running command.
pub struct CommandEnv<'a> {
    /// Registry the command was resolved from; used to dispatch sub-accesses.
    pub registry: &'a CommandRegistry,
    /// Dictionary client.
    pub client: &'a mut dyn DictionaryClient,
    /// Sequencer settings.
    pub sequencer: &'a SequencerConfig,
    /// Interactive input.
    pub input: &'a mut dyn BufRead,
    /// Interactive output.
    pub output: &'a mut dyn Write,
    /// Cleared on Ctrl-C.
    pub running: Arc<AtomicBool>,
}

impl CommandEnv<'_> {
    /// Whether the user asked to stop.
    pub fn interrupted(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }
}

/// Trait defining the interface for tool commands.
///
/// Commands are constructed once, registered in a `CommandRegistry` and
/// immutable afterwards.
pub trait Command {
    /// Unique command name.
    fn name(&self) -> &'static str;

    /// One-line description for the usage table.
    fn brief(&self) -> &'static str;

    /// Argument synopsis, e.g. `<INDEX> <SUBINDEX>`.
    fn synopsis(&self) -> &'static str {
        ""
    }

    /// Long help body.
    fn description(&self) -> String {
        format!("{}.\n", self.brief())
    }

    /// Full help text.
    fn help(&self, binary: &str) -> String {
        format!(
            "{binary} {} [OPTIONS] {}\n\n{}",
            self.name(),
            self.synopsis(),
            self.description()
        )
    }

    /// True iff the name starts with `token` (case-sensitive, non-empty token).
    fn matches_prefix(&self, token: &str) -> bool {
        !token.is_empty() && self.name().starts_with(token)
    }

    /// True iff the characters of `token` occur in the name in order.
    fn matches_abbrev(&self, token: &str) -> bool {
        matches_abbreviation(token, self.name())
    }

    /// Run the command.
    fn execute(
        &self,
        args: &[String],
        ctx: &ExecutionContext,
        env: &mut CommandEnv<'_>,
    ) -> Result<CommandOutput, CommandError>;
}

/// Ordered-subsequence match of `token` against `name`.
pub fn matches_abbreviation(token: &str, name: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let mut rest = name.chars();
    token.chars().all(|c| rest.by_ref().any(|n| n == c))
}

/// Fail with a usage error unless exactly `expected` arguments were given.
pub fn expect_args(args: &[String], expected: usize) -> Result<(), CommandError> {
    if args.len() != expected {
        return Err(CommandError::Usage(format!(
            "'{expected}' arguments expected, {} given.",
            args.len()
        )));
    }
    Ok(())
}

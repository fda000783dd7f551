//! # ECAT Tool Library
//!
//! Object dictionary access and CiA 402 drive sequencing behind a command
//! line of abbreviated commands.
//!
//! # Module Structure
//!
//! - [`command`] - Command trait, outputs and errors
//! - [`command_registry`] - Command registration and abbreviation resolution
//! - [`commands`] - Built-in commands
//! - [`context`] - Execution context built from the global options
//! - [`sequencer`] - Drive power-up and profile-position move sequences
//! - [`clients`] - Dictionary client implementations
//! - [`error`] - Startup errors
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ecat_tool                             │
//! │  ┌──────────┐   resolve   ┌─────────────────┐                │
//! │  │   CLI    │────────────►│ CommandRegistry │                │
//! │  └──────────┘             └────────┬────────┘                │
//! │                                    │ execute                 │
//! │                                    ▼                         │
//! │  ┌───────────────┐  download/ ┌──────────┐                   │
//! │  │ DriveSequencer│──upload───►│ Commands │                   │
//! │  └───────────────┘  by name   └────┬─────┘                   │
//! │                                    ▼                         │
//! │                         ┌──────────────────┐                 │
//! │                         │ DictionaryClient │ (trait object)  │
//! │                         └──────────────────┘                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod clients;
pub mod command;
pub mod command_registry;
pub mod commands;
pub mod context;
pub mod error;
pub mod sequencer;

// Re-export key types for convenience
pub use crate::command::{Command, CommandEnv, CommandError, CommandOutput};
pub use crate::command_registry::{CommandRegistry, ResolutionError};
pub use crate::context::{ContextOptions, ExecutionContext, Verbosity};
pub use crate::error::ToolError;
pub use crate::sequencer::{DriveSequencer, SequenceError, SequenceReport, SequenceStep};

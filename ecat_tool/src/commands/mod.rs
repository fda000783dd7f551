//! Built-in tool commands.
//!
//! - [`download`] - Write one dictionary entry
//! - [`init`] - Bring the selected drive into "operation enabled"
//! - [`motion`] - Initialize and run one profile-position move
//! - [`shell`] - Interactive move loop
//! - [`status`] - Read and decode the status word
//! - [`upload`] - Read one dictionary entry
//!
//! # Adding New Commands
//!
//! 1. Create a new submodule under `commands/`
//! 2. Implement the `Command` trait from `crate::command`
//! 3. Register it in `register_all_commands()`, keeping the list sorted

pub mod download;
pub mod init;
pub mod motion;
pub mod shell;
pub mod status;
pub mod upload;

use crate::command::CommandError;
use crate::command_registry::CommandRegistry;
use crate::context::ExecutionContext;
use crate::sequencer::SequenceReport;
use ecat_common::od::types::ValueError;
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

/// Register all built-in commands, in usage-table order.
pub fn register_all_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(download::DownloadCommand));
    registry.register(Box::new(init::InitCommand));
    registry.register(Box::new(motion::MoveCommand));
    registry.register(Box::new(shell::ShellCommand));
    registry.register(Box::new(status::StatusCommand));
    registry.register(Box::new(upload::UploadCommand));
}

/// Registry holding every built-in command.
pub fn build_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register_all_commands(&mut registry);
    registry
}

/// Write `report` as JSON to the context's output file, if one was given.
pub(crate) fn write_report(
    ctx: &ExecutionContext,
    report: &SequenceReport,
) -> Result<(), CommandError> {
    let Some(path) = ctx.output_file.as_deref() else {
        return Ok(());
    };
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report).map_err(std::io::Error::from)?;
    info!(path = %path.display(), "Sequence report written");
    Ok(())
}

pub(crate) fn usage_error(err: ValueError) -> CommandError {
    CommandError::Usage(err.to_string())
}

pub(crate) fn missing_type_error() -> CommandError {
    CommandError::Usage("Please specify a data type with --type.".to_string())
}

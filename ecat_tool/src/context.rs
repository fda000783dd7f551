//! Execution context shared by every command invocation.
//!
//! Built once from the global options, passed by reference into each
//! command and into the sequencer. Nothing mutates it while a command runs.

use crate::command::CommandError;
use ecat_common::consts::SELECT_ALL;
use ecat_common::od::client::{DeviceAddress, DictionaryClient};
use ecat_common::od::types::DataType;
use ecat_common::selector::Selector;
use std::path::PathBuf;
use tracing::debug;

/// Output verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Output less information.
    Quiet,
    /// Default.
    #[default]
    Normal,
    /// Output more information.
    Verbose,
}

/// Global options as seen by a command.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Masters to select (`-` = all).
    pub masters: Selector,
    /// Slave ring positions to select.
    pub positions: Selector,
    /// Slave aliases to select.
    pub aliases: Selector,
    /// Domains to select.
    pub domains: Selector,
    /// Data type for dictionary accesses.
    pub data_type: Option<DataType>,
    /// File that receives machine-readable command output.
    pub output_file: Option<PathBuf>,
    /// Output skin name.
    pub skin: Option<String>,
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// Force the command (continue past unverified drive transitions).
    pub force: bool,
}

/// Raw option strings, as parsed from the command line.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub masters: String,
    pub positions: String,
    pub aliases: String,
    pub domains: String,
    pub data_type: Option<String>,
    pub output_file: Option<PathBuf>,
    pub skin: Option<String>,
    pub verbosity: Verbosity,
    pub force: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            masters: SELECT_ALL.to_string(),
            positions: SELECT_ALL.to_string(),
            aliases: SELECT_ALL.to_string(),
            domains: SELECT_ALL.to_string(),
            data_type: None,
            output_file: None,
            skin: None,
            verbosity: Verbosity::Normal,
            force: false,
        }
    }
}

impl ExecutionContext {
    /// Validate option strings and build the context.
    ///
    /// # Errors
    /// Returns `CommandError::Usage` for malformed selectors or an unknown
    /// data type.
    pub fn from_options(options: ContextOptions) -> Result<Self, CommandError> {
        let selector =
            |text: &str| Selector::parse(text).map_err(|e| CommandError::Usage(e.to_string()));
        let data_type = match options.data_type.as_deref() {
            None | Some("") => None,
            Some(name) => Some(
                name.parse::<DataType>()
                    .map_err(|e| CommandError::Usage(e.to_string()))?,
            ),
        };

        Ok(Self {
            masters: selector(&options.masters)?,
            positions: selector(&options.positions)?,
            aliases: selector(&options.aliases)?,
            domains: selector(&options.domains)?,
            data_type,
            output_file: options.output_file,
            skin: options.skin.filter(|s| !s.is_empty()),
            verbosity: options.verbosity,
            force: options.force,
        })
    }

    /// Copy of this context with a different data type, for one access.
    pub fn with_data_type(&self, data_type: DataType) -> Self {
        Self {
            data_type: Some(data_type),
            ..self.clone()
        }
    }

    /// Resolve the selectors to exactly one slave.
    ///
    /// # Errors
    /// Returns `CommandError::Failed` if zero or several masters or slaves
    /// match, `CommandError::Device` if the client cannot list slaves.
    pub fn device(&self, client: &mut dyn DictionaryClient) -> Result<DeviceAddress, CommandError> {
        let masters: Vec<u32> = client
            .masters()
            .into_iter()
            .filter(|m| self.masters.matches(*m))
            .collect();
        let master = match masters.as_slice() {
            [only] => *only,
            [] => return Err(CommandError::Failed("No master selected!".to_string())),
            _ => {
                return Err(CommandError::Failed(
                    "A single master must be selected!".to_string(),
                ));
            }
        };

        let slaves: Vec<_> = client
            .slaves(master)?
            .into_iter()
            .filter(|s| {
                self.positions.matches(u32::from(s.position))
                    && self.aliases.matches(u32::from(s.alias))
            })
            .collect();

        match slaves.as_slice() {
            [only] => {
                debug!(master, position = only.position, name = %only.name, "Selected slave");
                Ok(DeviceAddress {
                    master,
                    position: only.position,
                })
            }
            [] => Err(CommandError::Failed("No slave selected!".to_string())),
            _ => Err(CommandError::Failed(format!(
                "{} slaves selected. Please select only one!",
                slaves.len()
            ))),
        }
    }

    /// Whether informational output should be printed.
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }
}

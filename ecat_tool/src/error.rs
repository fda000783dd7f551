//! Tool startup errors.

use ecat_common::config::ConfigError;
use ecat_common::od::client::OdError;
use thiserror::Error;

/// Errors raised before a command runs.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `client.driver` names no built-in client.
    #[error("Unknown dictionary client '{0}'")]
    UnknownClient(String),

    /// Client creation failed.
    #[error("Failed to create dictionary client: {0}")]
    Client(#[from] OdError),
}

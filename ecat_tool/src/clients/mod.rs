//! Dictionary client implementations.
//!
//! - [`simulation`] - Simulated master and drives for development and testing
//!
//! # Adding New Clients
//!
//! 1. Create a new submodule under `clients/`
//! 2. Implement the `DictionaryClient` trait from `ecat_common::od::client`
//! 3. Add its factory to `CLIENTS`

pub mod simulation;

use crate::error::ToolError;
use ecat_common::config::ToolConfig;
use ecat_common::od::client::{ClientFactory, DictionaryClient};
use tracing::info;

/// Built-in client factories by name.
pub const CLIENTS: &[(&str, ClientFactory)] = &[(simulation::NAME, simulation::create_client)];

/// Look up a client factory by name.
pub fn client_factory(name: &str) -> Option<ClientFactory> {
    CLIENTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, factory)| *factory)
}

/// Create the client selected by `config.client.driver`.
///
/// # Errors
/// `ToolError::UnknownClient` if no client has that name, or the client's
/// own creation error.
pub fn create_client(config: &ToolConfig) -> Result<Box<dyn DictionaryClient>, ToolError> {
    let name = config.client.driver.as_str();
    let factory = client_factory(name).ok_or_else(|| ToolError::UnknownClient(name.to_string()))?;
    let client = factory(config)?;
    info!(client = client.name(), "Dictionary client ready");
    Ok(client)
}

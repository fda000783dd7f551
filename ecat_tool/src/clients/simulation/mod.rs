//! Simulation client.
//!
//! A software master with CiA 402 drives, for development and testing
//! without a physical bus.

mod drive;
mod master;

pub use drive::SimulatedDrive;
pub use master::{AccessKind, JournalEntry, SimulatedMaster};

use ecat_common::config::ToolConfig;
use ecat_common::od::client::{DictionaryClient, OdError};

/// Registered client name.
pub const NAME: &str = "simulation";

/// Factory function to create a simulation client instance.
pub fn create_client(config: &ToolConfig) -> Result<Box<dyn DictionaryClient>, OdError> {
    Ok(Box::new(SimulatedMaster::from_config(config)))
}

//! Dictionary client trait and error types.
//!
//! This module defines:
//! - `DictionaryClient` trait - Interface for the transport that performs
//!   uploads (reads) and downloads (writes) against a remote device
//! - `OdError` enum - Transport and protocol failures
//! - `ClientFactory` type alias - Factory function type
//! - `DeviceAddress` / `SlaveInfo` - Device addressing on a master

use crate::config::ToolConfig;
use crate::od::types::{DataType, DictionaryAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error types for dictionary accesses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OdError {
    /// No master with this index.
    #[error("Master {0} does not exist")]
    MasterNotFound(u32),

    /// No slave at this position.
    #[error("Slave {position} does not exist on master {master}")]
    SlaveNotFound {
        /// Master index.
        master: u32,
        /// Ring position.
        position: u16,
    },

    /// Device does not answer.
    #[error("Device unreachable: {0}")]
    Unreachable(String),

    /// Entry does not exist in the dictionary.
    #[error("SDO {0} does not exist")]
    InvalidAddress(DictionaryAddress),

    /// Entry exists but cannot be written.
    #[error("SDO {0} is read-only")]
    AccessDenied(DictionaryAddress),

    /// Declared type differs from the entry's type.
    #[error("Type mismatch for {address}: entry is {actual}")]
    TypeMismatch {
        /// Requested address.
        address: DictionaryAddress,
        /// Type of the entry on the device.
        actual: DataType,
    },

    /// Reply could not be decoded.
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// Value cannot be represented in the declared width.
    #[error("Value {value:#x} cannot be represented as {data_type}")]
    ValueOutOfRange {
        /// Raw value.
        value: u64,
        /// Declared type.
        data_type: DataType,
    },

    /// Access did not complete within the configured timeout.
    #[error("Access to SDO {address} timed out after {timeout:?}")]
    Timeout {
        /// Requested address.
        address: DictionaryAddress,
        /// Configured per-access timeout.
        timeout: Duration,
    },

    /// Device aborted the transfer.
    #[error("SDO transfer aborted with code {code:#010x}")]
    Aborted {
        /// Abort code reported by the device.
        code: u32,
    },
}

/// Address of one slave on one master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceAddress {
    /// Master index.
    pub master: u32,
    /// Ring position of the slave.
    pub position: u16,
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.master, self.position)
    }
}

/// Slave as reported by a master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaveInfo {
    /// Ring position.
    pub position: u16,
    /// Configured station alias (0 = none).
    pub alias: u16,
    /// Device name.
    pub name: String,
}

/// Factory function type for creating client instances.
pub type ClientFactory = fn(&ToolConfig) -> Result<Box<dyn DictionaryClient>, OdError>;

/// Trait defining the interface for dictionary clients.
///
/// The tool manages the transport only through this trait, so the EtherCAT
/// master, a CANopen bridge or the simulation are interchangeable.
///
/// # Contract
///
/// - Every call blocks until the access completes or fails
/// - Calls are never overlapped; the caller issues one access at a time
/// - Values are raw words masked to the address's declared width
/// - Implementations bound each access by the configured timeout and report
///   expiry as `OdError::Timeout`
pub trait DictionaryClient {
    /// Returns the client's unique identifier (e.g., "simulation", "ethercat").
    fn name(&self) -> &'static str;

    /// Indices of the masters this client can reach.
    fn masters(&self) -> Vec<u32>;

    /// Slaves on the given master, ordered by ring position.
    fn slaves(&mut self, master: u32) -> Result<Vec<SlaveInfo>, OdError>;

    /// Read one dictionary entry (SDO upload).
    fn upload(
        &mut self,
        device: &DeviceAddress,
        address: &DictionaryAddress,
    ) -> Result<u64, OdError>;

    /// Write one dictionary entry (SDO download).
    ///
    /// # Errors
    /// Returns `OdError::ValueOutOfRange` if `value` exceeds the declared width.
    fn download(
        &mut self,
        device: &DeviceAddress,
        address: &DictionaryAddress,
        value: u64,
    ) -> Result<(), OdError>;
}

impl<C: DictionaryClient + ?Sized> DictionaryClient for Box<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn masters(&self) -> Vec<u32> {
        (**self).masters()
    }

    fn slaves(&mut self, master: u32) -> Result<Vec<SlaveInfo>, OdError> {
        (**self).slaves(master)
    }

    fn upload(
        &mut self,
        device: &DeviceAddress,
        address: &DictionaryAddress,
    ) -> Result<u64, OdError> {
        (**self).upload(device, address)
    }

    fn download(
        &mut self,
        device: &DeviceAddress,
        address: &DictionaryAddress,
        value: u64,
    ) -> Result<(), OdError> {
        (**self).download(device, address, value)
    }
}

/// Check that `value` fits the declared width of `address`.
pub fn check_width(address: &DictionaryAddress, value: u64) -> Result<(), OdError> {
    if value & !address.data_type.mask() != 0 {
        return Err(OdError::ValueOutOfRange {
            value,
            data_type: address.data_type,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullClient;

    impl DictionaryClient for NullClient {
        fn name(&self) -> &'static str {
            "null"
        }

        fn masters(&self) -> Vec<u32> {
            vec![0]
        }

        fn slaves(&mut self, _master: u32) -> Result<Vec<SlaveInfo>, OdError> {
            Ok(Vec::new())
        }

        fn upload(
            &mut self,
            device: &DeviceAddress,
            _address: &DictionaryAddress,
        ) -> Result<u64, OdError> {
            Err(OdError::SlaveNotFound {
                master: device.master,
                position: device.position,
            })
        }

        fn download(
            &mut self,
            _device: &DeviceAddress,
            address: &DictionaryAddress,
            value: u64,
        ) -> Result<(), OdError> {
            check_width(address, value)
        }
    }

    #[test]
    fn od_error_display() {
        let addr = DictionaryAddress::new(0x6041, 0, DataType::Uint16);
        assert!(OdError::AccessDenied(addr).to_string().contains("0x6041:00"));

        let err = OdError::ValueOutOfRange {
            value: 0x1_0000,
            data_type: DataType::Uint16,
        };
        assert!(err.to_string().contains("0x10000"));
        assert!(err.to_string().contains("uint16"));
    }

    #[test]
    fn check_width_rejects_wide_values() {
        let addr = DictionaryAddress::new(0x6040, 0, DataType::Uint16);
        assert!(check_width(&addr, 0xffff).is_ok());
        assert!(matches!(
            check_width(&addr, 0x1_0000),
            Err(OdError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn boxed_client_forwards_calls() {
        let mut client: Box<dyn DictionaryClient> = Box::new(NullClient);
        let device = DeviceAddress { master: 0, position: 3 };
        let addr = DictionaryAddress::new(0x6040, 0, DataType::Uint16);

        assert_eq!(client.name(), "null");
        assert_eq!(client.masters(), vec![0]);
        assert!(client.slaves(0).unwrap().is_empty());
        assert!(matches!(
            client.upload(&device, &addr),
            Err(OdError::SlaveNotFound { position: 3, .. })
        ));
        assert!(client.download(&device, &addr, 0x10_0000).is_err());
    }
}

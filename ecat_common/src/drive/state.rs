//! Drive power states.
//!
//! `PowerState` is the CiA 402 device state decoded from the status word.
//! `DriveState` is the coarser state the initialization sequence believes the
//! drive to be in after each command word it wrote.

use crate::drive::words::StatusWord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CiA 402 device state decoded from the status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PowerState {
    /// Low-level power on, drive not ready.
    NotReadyToSwitchOn = 0,
    /// Drive initialized, high voltage may be applied.
    SwitchOnDisabled = 1,
    /// Waiting for switch on.
    ReadyToSwitchOn = 2,
    /// Power stage on, no torque.
    SwitchedOn = 3,
    /// Drive follows set-points.
    OperationEnabled = 4,
    /// Quick stop ramp active.
    QuickStopActive = 5,
    /// Fault reaction in progress.
    FaultReactionActive = 6,
    /// Drive faulted.
    Fault = 7,
}

impl PowerState {
    /// Decode the state bits of a status word.
    pub const fn from_status(status: StatusWord) -> Self {
        let bits = status.bits();
        // Standard masks: 0x4F for the "disabled/fault" family, 0x6F otherwise.
        match bits & 0x004F {
            0x0000 => return Self::NotReadyToSwitchOn,
            0x0040 => return Self::SwitchOnDisabled,
            0x000F => return Self::FaultReactionActive,
            0x0008 => return Self::Fault,
            _ => {}
        }
        match bits & 0x006F {
            0x0021 => Self::ReadyToSwitchOn,
            0x0023 => Self::SwitchedOn,
            0x0027 => Self::OperationEnabled,
            0x0007 => Self::QuickStopActive,
            _ => Self::NotReadyToSwitchOn,
        }
    }

    /// Decode a raw status word.
    pub const fn from_raw(raw: u16) -> Self {
        Self::from_status(StatusWord::from_raw(raw))
    }

    /// Canonical status bits for this state (quick stop inactive, voltage on
    /// where the state implies it).
    pub const fn status_bits(self) -> u16 {
        match self {
            Self::NotReadyToSwitchOn => 0x0000,
            Self::SwitchOnDisabled => 0x0040,
            Self::ReadyToSwitchOn => 0x0021,
            Self::SwitchedOn => 0x0033,
            Self::OperationEnabled => 0x0037,
            Self::QuickStopActive => 0x0017,
            Self::FaultReactionActive => 0x001F,
            Self::Fault => 0x0008,
        }
    }

    /// Whether the drive reports a fault.
    pub const fn is_fault(self) -> bool {
        matches!(self, Self::Fault | Self::FaultReactionActive)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotReadyToSwitchOn => "not ready to switch on",
            Self::SwitchOnDisabled => "switch on disabled",
            Self::ReadyToSwitchOn => "ready to switch on",
            Self::SwitchedOn => "switched on",
            Self::OperationEnabled => "operation enabled",
            Self::QuickStopActive => "quick stop active",
            Self::FaultReactionActive => "fault reaction active",
            Self::Fault => "fault",
        };
        f.write_str(name)
    }
}

/// State the initialization sequence assumes after each write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum DriveState {
    /// Nothing written yet; actual state unknown.
    #[default]
    Uninitialized = 0,
    /// Fault reset pulse written.
    FaultResetRequested = 1,
    /// Shutdown written.
    ReadyToSwitchOn = 2,
    /// Switch on written.
    SwitchedOn = 3,
    /// Enable operation written.
    OperationEnabled = 4,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_standard_patterns() {
        assert_eq!(PowerState::from_raw(0x0000), PowerState::NotReadyToSwitchOn);
        assert_eq!(PowerState::from_raw(0x0250), PowerState::SwitchOnDisabled);
        assert_eq!(PowerState::from_raw(0x0231), PowerState::ReadyToSwitchOn);
        assert_eq!(PowerState::from_raw(0x0233), PowerState::SwitchedOn);
        assert_eq!(PowerState::from_raw(0x0237), PowerState::OperationEnabled);
        assert_eq!(PowerState::from_raw(0x1637), PowerState::OperationEnabled);
        assert_eq!(PowerState::from_raw(0x0217), PowerState::QuickStopActive);
        assert_eq!(PowerState::from_raw(0x021F), PowerState::FaultReactionActive);
        assert_eq!(PowerState::from_raw(0x0218), PowerState::Fault);
    }

    #[test]
    fn canonical_bits_round_trip() {
        for state in [
            PowerState::NotReadyToSwitchOn,
            PowerState::SwitchOnDisabled,
            PowerState::ReadyToSwitchOn,
            PowerState::SwitchedOn,
            PowerState::OperationEnabled,
            PowerState::QuickStopActive,
            PowerState::FaultReactionActive,
            PowerState::Fault,
        ] {
            assert_eq!(PowerState::from_raw(state.status_bits()), state, "{state}");
        }
    }

    #[test]
    fn fault_states() {
        assert!(PowerState::Fault.is_fault());
        assert!(PowerState::FaultReactionActive.is_fault());
        assert!(!PowerState::OperationEnabled.is_fault());
    }

    #[test]
    fn drive_state_defaults_to_uninitialized() {
        assert_eq!(DriveState::default(), DriveState::Uninitialized);
    }
}

//! Control word and status word bit definitions.
//!
//! Both words use the `bitflags` crate. The fixed command words written by
//! the sequencer are defined here as plain `u16` constants so they can be
//! compared bit-exact against what reaches the wire.

use crate::od::client::OdError;
use bitflags::bitflags;
use static_assertions::const_assert_eq;

bitflags! {
    /// Control word bits (0x6040).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlWord: u16 {
        /// Switch on.
        const SWITCH_ON          = 0x0001;
        /// Enable voltage.
        const ENABLE_VOLTAGE     = 0x0002;
        /// Quick stop (active low).
        const QUICK_STOP         = 0x0004;
        /// Enable operation.
        const ENABLE_OPERATION   = 0x0008;
        /// Profile position: new set-point (rising edge starts motion).
        const NEW_SET_POINT      = 0x0010;
        /// Profile position: change set immediately.
        const CHANGE_IMMEDIATELY = 0x0020;
        /// Profile position: target is relative to the current target.
        const RELATIVE           = 0x0040;
        /// Fault reset (rising edge).
        const FAULT_RESET        = 0x0080;
        /// Halt.
        const HALT               = 0x0100;
    }
}

/// Fault reset pulse written first by the initialization sequence.
pub const CW_FAULT_RESET: u16 = 0x00FF;
/// Shutdown: towards "ready to switch on".
pub const CW_SHUTDOWN: u16 = 0x0006;
/// Switch on: towards "switched on".
pub const CW_SWITCH_ON: u16 = 0x0007;
/// Enable operation: towards "operation enabled".
pub const CW_ENABLE_OPERATION: u16 = 0x000F;
/// Arm a relative set-point, change immediately, no trigger yet.
pub const CW_ARM_SET_POINT: u16 = 0x006F;
/// Same as `CW_ARM_SET_POINT` with the new set-point bit raised.
pub const CW_TRIGGER_SET_POINT: u16 = 0x007F;

const_assert_eq!(
    CW_ENABLE_OPERATION,
    ControlWord::SWITCH_ON.bits()
        | ControlWord::ENABLE_VOLTAGE.bits()
        | ControlWord::QUICK_STOP.bits()
        | ControlWord::ENABLE_OPERATION.bits()
);
const_assert_eq!(
    CW_TRIGGER_SET_POINT,
    CW_ARM_SET_POINT | ControlWord::NEW_SET_POINT.bits()
);

/// Device command encoded by bits 0-3 and 7 of a control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Bit 7 set.
    FaultReset,
    /// `0xxx x110`.
    Shutdown,
    /// `0xxx 0111`.
    SwitchOn,
    /// `0xxx 1111`.
    EnableOperation,
    /// `0xxx xx0x`.
    DisableVoltage,
    /// `0xxx x01x`.
    QuickStop,
}

impl ControlWord {
    /// Decode the state machine command carried by this word.
    pub const fn command(self) -> DeviceCommand {
        let bits = self.bits();
        if bits & 0x0080 != 0 {
            DeviceCommand::FaultReset
        } else if bits & 0x0002 == 0 {
            DeviceCommand::DisableVoltage
        } else if bits & 0x0006 == 0x0002 {
            DeviceCommand::QuickStop
        } else if bits & 0x0007 == 0x0006 {
            DeviceCommand::Shutdown
        } else if bits & 0x000F == 0x0007 {
            DeviceCommand::SwitchOn
        } else {
            DeviceCommand::EnableOperation
        }
    }
}

bitflags! {
    /// Status word bits (0x6041).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusWord: u16 {
        /// Ready to switch on.
        const READY_TO_SWITCH_ON  = 0x0001;
        /// Switched on.
        const SWITCHED_ON         = 0x0002;
        /// Operation enabled.
        const OPERATION_ENABLED   = 0x0004;
        /// Fault.
        const FAULT               = 0x0008;
        /// Voltage enabled.
        const VOLTAGE_ENABLED     = 0x0010;
        /// Quick stop (active low).
        const QUICK_STOP          = 0x0020;
        /// Switch on disabled.
        const SWITCH_ON_DISABLED  = 0x0040;
        /// Warning.
        const WARNING             = 0x0080;
        /// Remote.
        const REMOTE              = 0x0200;
        /// Target reached.
        const TARGET_REACHED      = 0x0400;
        /// Internal limit active.
        const INTERNAL_LIMIT      = 0x0800;
        /// Profile position: set-point acknowledge.
        const SET_POINT_ACK       = 0x1000;
        /// Profile position: following error.
        const FOLLOWING_ERROR     = 0x2000;
    }
}

impl StatusWord {
    /// Build from a raw word, keeping unknown bits.
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self::from_bits_retain(raw)
    }

    /// Decode an uploaded status word.
    ///
    /// # Errors
    /// `OdError::MalformedReply` if the reply does not fit in 16 bits.
    pub fn from_reply(raw: u64) -> Result<Self, OdError> {
        u16::try_from(raw)
            .map(Self::from_raw)
            .map_err(|_| OdError::MalformedReply(format!("status word {raw:#x} exceeds 16 bits")))
    }

    /// Whether the fault bit is set.
    #[inline]
    pub const fn has_fault(self) -> bool {
        self.contains(Self::FAULT)
    }
}

//! Steps of the drive power-up and move sequences.
//!
//! Each step is the state the drive is believed to be in after the control
//! word that leads into it was written. `control_word()` is the word that
//! leaves a step, `expected()` the status check that confirms arrival.

use ecat_common::drive::state::{DriveState, PowerState};
use ecat_common::drive::words::{
    CW_ARM_SET_POINT, CW_ENABLE_OPERATION, CW_FAULT_RESET, CW_SHUTDOWN, CW_SWITCH_ON,
    CW_TRIGGER_SET_POINT,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Step of the drive sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SequenceStep {
    /// Step 0: Nothing written; actual state unknown.
    #[default]
    Init = 0,
    /// Step 1: Fault reset pulse written (0x00FF).
    FaultCleared = 1,
    /// Step 2: Shutdown written (0x0006).
    ShutdownRequested = 2,
    /// Step 3: Switch on written (0x0007).
    SwitchedOn = 3,
    /// Step 4: Enable operation written (0x000F).
    OperationEnabled = 4,
    /// Step 5: Set-point armed (0x006F).
    SetpointArmed = 5,
    /// Step 6: Set-point triggered (0x007F). Terminal.
    MotionTriggered = 6,
}

impl SequenceStep {
    /// Advance to the next step.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::FaultCleared),
            Self::FaultCleared => Some(Self::ShutdownRequested),
            Self::ShutdownRequested => Some(Self::SwitchedOn),
            Self::SwitchedOn => Some(Self::OperationEnabled),
            Self::OperationEnabled => Some(Self::SetpointArmed),
            Self::SetpointArmed => Some(Self::MotionTriggered),
            Self::MotionTriggered => None,
        }
    }

    /// Control word written to leave this step.
    pub const fn control_word(self) -> Option<u16> {
        match self {
            Self::Init => Some(CW_FAULT_RESET),
            Self::FaultCleared => Some(CW_SHUTDOWN),
            Self::ShutdownRequested => Some(CW_SWITCH_ON),
            Self::SwitchedOn => Some(CW_ENABLE_OPERATION),
            Self::OperationEnabled => Some(CW_ARM_SET_POINT),
            Self::SetpointArmed => Some(CW_TRIGGER_SET_POINT),
            Self::MotionTriggered => None,
        }
    }

    /// Whether `state` confirms the drive has reached this step.
    pub const fn expected(self, state: PowerState) -> bool {
        match self {
            Self::Init => true,
            Self::FaultCleared => !state.is_fault(),
            Self::ShutdownRequested => matches!(state, PowerState::ReadyToSwitchOn),
            Self::SwitchedOn => matches!(state, PowerState::SwitchedOn),
            Self::OperationEnabled | Self::SetpointArmed | Self::MotionTriggered => {
                matches!(state, PowerState::OperationEnabled)
            }
        }
    }

    /// Coarse drive state implied by this step.
    pub const fn drive_state(self) -> DriveState {
        match self {
            Self::Init => DriveState::Uninitialized,
            Self::FaultCleared => DriveState::FaultResetRequested,
            Self::ShutdownRequested => DriveState::ReadyToSwitchOn,
            Self::SwitchedOn => DriveState::SwitchedOn,
            Self::OperationEnabled | Self::SetpointArmed | Self::MotionTriggered => {
                DriveState::OperationEnabled
            }
        }
    }

    /// Whether a set-point may be armed from this step.
    pub const fn accepts_set_point(self) -> bool {
        matches!(
            self,
            Self::OperationEnabled | Self::SetpointArmed | Self::MotionTriggered
        )
    }
}

impl fmt::Display for SequenceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::FaultCleared => "fault cleared",
            Self::ShutdownRequested => "shutdown requested",
            Self::SwitchedOn => "switched on",
            Self::OperationEnabled => "operation enabled",
            Self::SetpointArmed => "set-point armed",
            Self::MotionTriggered => "motion triggered",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_visits_every_step_once() {
        let mut step = SequenceStep::Init;
        let mut words = Vec::new();
        while let Some(word) = step.control_word() {
            words.push(word);
            step = step.next().unwrap();
        }
        assert_eq!(step, SequenceStep::MotionTriggered);
        assert_eq!(words, vec![0x00FF, 0x0006, 0x0007, 0x000F, 0x006F, 0x007F]);
    }

    #[test]
    fn terminal_step_has_no_successor() {
        assert_eq!(SequenceStep::MotionTriggered.next(), None);
        assert_eq!(SequenceStep::MotionTriggered.control_word(), None);
    }

    #[test]
    fn expected_states() {
        assert!(SequenceStep::FaultCleared.expected(PowerState::SwitchOnDisabled));
        assert!(!SequenceStep::FaultCleared.expected(PowerState::Fault));
        assert!(SequenceStep::ShutdownRequested.expected(PowerState::ReadyToSwitchOn));
        assert!(!SequenceStep::SwitchedOn.expected(PowerState::ReadyToSwitchOn));
        assert!(SequenceStep::MotionTriggered.expected(PowerState::OperationEnabled));
    }

    #[test]
    fn drive_state_mapping() {
        assert_eq!(SequenceStep::Init.drive_state(), DriveState::Uninitialized);
        assert_eq!(
            SequenceStep::SetpointArmed.drive_state(),
            DriveState::OperationEnabled
        );
        assert!(!SequenceStep::SwitchedOn.accepts_set_point());
        assert!(SequenceStep::MotionTriggered.accepts_set_point());
    }
}

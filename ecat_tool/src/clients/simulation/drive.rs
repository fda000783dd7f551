//! Simulated CiA 402 drive.
//!
//! Holds a small object dictionary and a power state machine driven by
//! control-word writes. Profile-position set-points complete instantly.

use ecat_common::config::SimSlaveConfig;
use ecat_common::drive::objects::{
    CONTROL_WORD, ERROR_CODE, MODE_PROFILE_POSITION, MODES_OF_OPERATION,
    MODES_OF_OPERATION_DISPLAY, POSITION_ACTUAL, PROFILE_VELOCITY, STATUS_WORD, TARGET_POSITION,
};
use ecat_common::drive::state::PowerState;
use ecat_common::drive::words::{ControlWord, DeviceCommand, StatusWord};
use ecat_common::od::client::{OdError, SlaveInfo, check_width};
use ecat_common::od::types::{DataType, DictionaryAddress, decode_value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

/// Device type (0x1000:0).
const DEVICE_TYPE: DictionaryAddress = DictionaryAddress::new(0x1000, 0, DataType::Uint32);
/// CiA 402 servo drive.
const DEVICE_TYPE_SERVO: u64 = 0x0002_0192;
/// Error code reported by a drive configured to start faulted.
const INITIAL_FAULT_CODE: u64 = 0x8110;

#[derive(Debug, Clone, Copy)]
struct Entry {
    data_type: DataType,
    value: u64,
    writable: bool,
}

/// One simulated slave.
#[derive(Debug, Clone)]
pub struct SimulatedDrive {
    info: SlaveInfo,
    latency: Duration,
    entries: BTreeMap<(u16, u8), Entry>,
    power: PowerState,
    flags: StatusWord,
    last_control: ControlWord,
    frozen: bool,
}

impl SimulatedDrive {
    /// Create a drive from its configuration.
    pub fn new(config: &SimSlaveConfig) -> Self {
        let mut drive = Self {
            info: SlaveInfo {
                position: config.position,
                alias: config.alias,
                name: config.name.clone(),
            },
            latency: Duration::from_millis(config.latency_ms),
            entries: BTreeMap::new(),
            power: PowerState::SwitchOnDisabled,
            flags: StatusWord::empty(),
            last_control: ControlWord::empty(),
            frozen: false,
        };

        let mode = u64::from(MODE_PROFILE_POSITION as u8);
        drive.insert(DEVICE_TYPE, DEVICE_TYPE_SERVO, false);
        drive.insert(ERROR_CODE, 0, false);
        drive.insert(CONTROL_WORD, 0, true);
        drive.insert(STATUS_WORD, 0, false);
        drive.insert(MODES_OF_OPERATION, mode, true);
        drive.insert(MODES_OF_OPERATION_DISPLAY, mode, false);
        drive.insert(POSITION_ACTUAL, 0, false);
        drive.insert(TARGET_POSITION, 0, true);
        drive.insert(PROFILE_VELOCITY, 0, true);

        if config.initial_fault {
            drive.fault(INITIAL_FAULT_CODE);
        }
        drive.refresh_status();
        drive
    }

    fn insert(&mut self, address: DictionaryAddress, value: u64, writable: bool) {
        self.entries.insert(
            (address.index, address.subindex),
            Entry {
                data_type: address.data_type,
                value,
                writable,
            },
        );
    }

    /// Slave description.
    pub fn info(&self) -> &SlaveInfo {
        &self.info
    }

    /// Configured per-access latency.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Current power state.
    pub fn power_state(&self) -> PowerState {
        self.power
    }

    /// Current status word.
    pub fn status_word(&self) -> u16 {
        self.value(STATUS_WORD) as u16
    }

    /// Position actual value.
    pub fn position(&self) -> i32 {
        decode_value(self.value(POSITION_ACTUAL), DataType::Int32) as i32
    }

    /// Put the drive into the fault state with `code` in 0x603F.
    pub fn fault(&mut self, code: u64) {
        self.power = PowerState::Fault;
        self.set(ERROR_CODE, code);
        self.refresh_status();
    }

    /// Ignore control words: the power state stops changing.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Read an entry.
    ///
    /// # Errors
    /// `InvalidAddress` for unknown entries, `TypeMismatch` if the declared
    /// width differs from the entry's.
    pub fn read(&self, address: &DictionaryAddress) -> Result<u64, OdError> {
        let entry = self.entry(address)?;
        trace!(position = self.info.position, %address, value = entry.value, "Read");
        Ok(entry.value)
    }

    /// Write an entry and apply its side effects.
    ///
    /// # Errors
    /// `InvalidAddress`, `TypeMismatch`, `AccessDenied` for read-only entries
    /// and `ValueOutOfRange` if `value` exceeds the declared width.
    pub fn write(&mut self, address: &DictionaryAddress, value: u64) -> Result<(), OdError> {
        let entry = self.entry(address)?;
        if !entry.writable {
            return Err(OdError::AccessDenied(*address));
        }
        check_width(address, value)?;
        trace!(position = self.info.position, %address, value, "Write");
        self.set(*address, value);

        if address.index == CONTROL_WORD.index && address.subindex == CONTROL_WORD.subindex {
            self.apply_control(ControlWord::from_bits_retain(value as u16));
        } else if address.index == MODES_OF_OPERATION.index {
            self.set(MODES_OF_OPERATION_DISPLAY, value);
        }
        Ok(())
    }

    fn entry(&self, address: &DictionaryAddress) -> Result<Entry, OdError> {
        let entry = self
            .entries
            .get(&(address.index, address.subindex))
            .copied()
            .ok_or(OdError::InvalidAddress(*address))?;
        // Signedness may differ (0x607A travels as uint32); width may not.
        if entry.data_type.bit_width() != address.data_type.bit_width() {
            return Err(OdError::TypeMismatch {
                address: *address,
                actual: entry.data_type,
            });
        }
        Ok(entry)
    }

    fn value(&self, address: DictionaryAddress) -> u64 {
        self.entries
            .get(&(address.index, address.subindex))
            .map_or(0, |e| e.value)
    }

    fn set(&mut self, address: DictionaryAddress, value: u64) {
        if let Some(entry) = self.entries.get_mut(&(address.index, address.subindex)) {
            entry.value = value & entry.data_type.mask();
        }
    }

    fn apply_control(&mut self, word: ControlWord) {
        let previous = self.last_control;
        self.last_control = word;
        if self.frozen {
            return;
        }

        let before = self.power;
        if word.contains(ControlWord::FAULT_RESET) {
            // Only the rising edge resets, and only a faulted drive.
            if self.power == PowerState::Fault && !previous.contains(ControlWord::FAULT_RESET) {
                self.power = PowerState::SwitchOnDisabled;
                self.set(ERROR_CODE, 0);
            }
        } else {
            self.power = next_state(self.power, word.command());
            self.apply_set_point(previous, word);
        }

        if self.power != PowerState::OperationEnabled {
            self.flags = StatusWord::empty();
        }
        if before != self.power {
            debug!(position = self.info.position, from = %before, to = %self.power, "Power state changed");
        }
        self.refresh_status();
    }

    fn apply_set_point(&mut self, previous: ControlWord, word: ControlWord) {
        let rising = word.contains(ControlWord::NEW_SET_POINT)
            && !previous.contains(ControlWord::NEW_SET_POINT);
        if !word.contains(ControlWord::NEW_SET_POINT) {
            self.flags.remove(StatusWord::SET_POINT_ACK);
        }
        if !rising || self.power != PowerState::OperationEnabled {
            return;
        }

        let mode = decode_value(self.value(MODES_OF_OPERATION), DataType::Int8);
        if mode != i128::from(MODE_PROFILE_POSITION) {
            debug!(
                position = self.info.position,
                mode = mode as i64,
                "Set-point ignored outside profile position mode"
            );
            return;
        }

        let target = decode_value(self.value(TARGET_POSITION), DataType::Int32) as i32;
        let position = if word.contains(ControlWord::RELATIVE) {
            self.position().wrapping_add(target)
        } else {
            target
        };
        self.set(POSITION_ACTUAL, u64::from(position as u32));
        self.flags
            .insert(StatusWord::SET_POINT_ACK | StatusWord::TARGET_REACHED);
        debug!(
            position = self.info.position,
            target,
            actual = position,
            velocity = self.value(PROFILE_VELOCITY),
            "Set-point reached"
        );
    }

    fn refresh_status(&mut self) {
        let bits = self.power.status_bits() | StatusWord::REMOTE.bits() | self.flags.bits();
        self.set(STATUS_WORD, u64::from(bits));
    }
}

/// CiA 402 power state transition for one device command.
fn next_state(state: PowerState, command: DeviceCommand) -> PowerState {
    use PowerState::*;
    match (state, command) {
        (SwitchOnDisabled | ReadyToSwitchOn | SwitchedOn | OperationEnabled, DeviceCommand::Shutdown) => {
            ReadyToSwitchOn
        }
        (ReadyToSwitchOn | OperationEnabled, DeviceCommand::SwitchOn) => SwitchedOn,
        (SwitchedOn | QuickStopActive, DeviceCommand::EnableOperation) => OperationEnabled,
        (
            ReadyToSwitchOn | SwitchedOn | OperationEnabled | QuickStopActive,
            DeviceCommand::DisableVoltage,
        ) => SwitchOnDisabled,
        (OperationEnabled, DeviceCommand::QuickStop) => QuickStopActive,
        (ReadyToSwitchOn | SwitchedOn, DeviceCommand::QuickStop) => SwitchOnDisabled,
        (state, _) => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(initial_fault: bool) -> SimulatedDrive {
        SimulatedDrive::new(&SimSlaveConfig {
            position: 0,
            alias: 0,
            name: "EPOS3".to_string(),
            initial_fault,
            latency_ms: 0,
        })
    }

    fn control(drive: &mut SimulatedDrive, word: u16) {
        drive.write(&CONTROL_WORD, u64::from(word)).unwrap();
    }

    #[test]
    fn power_up_sequence_reaches_operation_enabled() {
        let mut d = drive(false);
        assert_eq!(d.power_state(), PowerState::SwitchOnDisabled);
        control(&mut d, 0x00FF);
        assert_eq!(d.power_state(), PowerState::SwitchOnDisabled);
        control(&mut d, 0x0006);
        assert_eq!(d.power_state(), PowerState::ReadyToSwitchOn);
        control(&mut d, 0x0007);
        assert_eq!(d.power_state(), PowerState::SwitchedOn);
        control(&mut d, 0x000F);
        assert_eq!(d.power_state(), PowerState::OperationEnabled);
        assert_eq!(PowerState::from_raw(d.status_word()), PowerState::OperationEnabled);
    }

    #[test]
    fn fault_reset_clears_fault_on_rising_edge() {
        let mut d = drive(true);
        assert_eq!(d.power_state(), PowerState::Fault);
        assert_eq!(d.read(&ERROR_CODE).unwrap(), INITIAL_FAULT_CODE);
        control(&mut d, 0x00FF);
        assert_eq!(d.power_state(), PowerState::SwitchOnDisabled);
        assert_eq!(d.read(&ERROR_CODE).unwrap(), 0);
    }

    #[test]
    fn relative_set_point_moves_on_rising_edge() {
        let mut d = drive(false);
        for word in [0x00FF, 0x0006, 0x0007, 0x000F] {
            control(&mut d, word);
        }
        d.write(&TARGET_POSITION, 50000).unwrap();
        control(&mut d, 0x006F);
        assert_eq!(d.position(), 0);
        control(&mut d, 0x007F);
        assert_eq!(d.position(), 50000);
        let status = StatusWord::from_raw(d.status_word());
        assert!(status.contains(StatusWord::SET_POINT_ACK | StatusWord::TARGET_REACHED));

        // Holding the trigger does not move again.
        control(&mut d, 0x007F);
        assert_eq!(d.position(), 50000);

        d.write(&TARGET_POSITION, 0xFFFF_3CB0).unwrap();
        control(&mut d, 0x006F);
        assert!(!StatusWord::from_raw(d.status_word()).contains(StatusWord::SET_POINT_ACK));
        control(&mut d, 0x007F);
        assert_eq!(d.position(), 0);
    }

    #[test]
    fn set_point_ignored_when_not_enabled() {
        let mut d = drive(false);
        d.write(&TARGET_POSITION, 100).unwrap();
        control(&mut d, 0x007F);
        assert_eq!(d.position(), 0);
    }

    #[test]
    fn status_word_is_read_only() {
        let mut d = drive(false);
        assert_eq!(d.write(&STATUS_WORD, 0), Err(OdError::AccessDenied(STATUS_WORD)));
    }

    #[test]
    fn width_mismatch_rejected_signedness_allowed() {
        let d = drive(false);
        let wide = CONTROL_WORD.with_type(DataType::Uint32);
        assert!(matches!(d.read(&wide), Err(OdError::TypeMismatch { .. })));
        let signed = POSITION_ACTUAL.with_type(DataType::Uint32);
        assert!(d.read(&signed).is_ok());
        let missing = DictionaryAddress::new(0x2000, 0, DataType::Uint8);
        assert_eq!(d.read(&missing), Err(OdError::InvalidAddress(missing)));
    }

    #[test]
    fn frozen_drive_ignores_control_words() {
        let mut d = drive(false);
        d.set_frozen(true);
        control(&mut d, 0x0006);
        assert_eq!(d.power_state(), PowerState::SwitchOnDisabled);
    }

    #[test]
    fn transition_table() {
        use PowerState::*;
        assert_eq!(next_state(OperationEnabled, DeviceCommand::SwitchOn), SwitchedOn);
        assert_eq!(next_state(OperationEnabled, DeviceCommand::QuickStop), QuickStopActive);
        assert_eq!(next_state(QuickStopActive, DeviceCommand::EnableOperation), OperationEnabled);
        assert_eq!(next_state(SwitchOnDisabled, DeviceCommand::SwitchOn), SwitchOnDisabled);
        assert_eq!(next_state(Fault, DeviceCommand::Shutdown), Fault);
    }
}

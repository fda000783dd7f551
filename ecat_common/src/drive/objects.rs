//! CiA 402 dictionary objects used by the drive sequencer.

use crate::od::types::{DataType, DictionaryAddress};

/// Control word (0x6040:0).
pub const CONTROL_WORD: DictionaryAddress = DictionaryAddress::new(0x6040, 0, DataType::Uint16);

/// Status word (0x6041:0), read-only.
pub const STATUS_WORD: DictionaryAddress = DictionaryAddress::new(0x6041, 0, DataType::Uint16);

/// Modes of operation (0x6060:0).
pub const MODES_OF_OPERATION: DictionaryAddress =
    DictionaryAddress::new(0x6060, 0, DataType::Int8);

/// Modes of operation display (0x6061:0), read-only.
pub const MODES_OF_OPERATION_DISPLAY: DictionaryAddress =
    DictionaryAddress::new(0x6061, 0, DataType::Int8);

/// Position actual value (0x6064:0), read-only.
pub const POSITION_ACTUAL: DictionaryAddress = DictionaryAddress::new(0x6064, 0, DataType::Int32);

/// Target position (0x607A:0), transmitted as its unsigned 32 bit pattern.
pub const TARGET_POSITION: DictionaryAddress =
    DictionaryAddress::new(0x607A, 0, DataType::Uint32);

/// Profile velocity (0x6081:0).
pub const PROFILE_VELOCITY: DictionaryAddress =
    DictionaryAddress::new(0x6081, 0, DataType::Uint32);

/// Error code (0x603F:0), read-only.
pub const ERROR_CODE: DictionaryAddress = DictionaryAddress::new(0x603F, 0, DataType::Uint16);

/// Profile position mode value for `MODES_OF_OPERATION`.
pub const MODE_PROFILE_POSITION: i8 = 1;

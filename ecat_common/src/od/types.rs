//! Dictionary addressing and value encoding.
//!
//! This module defines:
//! - `DataType` - The fixed set of integer widths an entry can have
//! - `DictionaryAddress` - `(index, subindex, data type)` of one entry
//! - Numeric parsing with the tool's base convention (`0x` hex, leading `0`
//!   octal, otherwise decimal)
//! - Raw value encoding/decoding and the `0x`-prefixed hex text format
//!
//! Values crossing the client seam are always raw unsigned words of the
//! declared width. Signed values exist only in text and are normalized to the
//! width's two's complement before they reach a client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing addresses, types or values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Text is not a number in any supported base.
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    /// Data type name is not one of the supported widths.
    #[error("Unknown data type '{0}'")]
    UnknownDataType(String),

    /// Value does not fit the declared width.
    #[error("Value {value} out of range for {data_type}")]
    OutOfRange {
        /// Value as given by the user.
        value: String,
        /// Declared type.
        data_type: DataType,
    },

    /// Index is not a 16 bit number.
    #[error("Invalid SDO index '{0}'")]
    InvalidIndex(String),

    /// Subindex is not an 8 bit number.
    #[error("Invalid SDO subindex '{0}'")]
    InvalidSubindex(String),
}

/// Data type of a dictionary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Unsigned 8 bit.
    Uint8,
    /// Unsigned 16 bit.
    Uint16,
    /// Unsigned 32 bit.
    Uint32,
    /// Unsigned 64 bit.
    Uint64,
    /// Signed 8 bit.
    Int8,
    /// Signed 16 bit.
    Int16,
    /// Signed 32 bit.
    Int32,
    /// Signed 64 bit.
    Int64,
}

impl DataType {
    /// All supported types, in the order they are listed in help texts.
    pub const ALL: [DataType; 8] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Uint8,
        Self::Uint16,
        Self::Uint32,
        Self::Uint64,
    ];

    /// Type name as accepted by `--type`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
        }
    }

    /// Width in bits.
    pub const fn bit_width(self) -> u32 {
        match self {
            Self::Uint8 | Self::Int8 => 8,
            Self::Uint16 | Self::Int16 => 16,
            Self::Uint32 | Self::Int32 => 32,
            Self::Uint64 | Self::Int64 => 64,
        }
    }

    /// Whether the value is interpreted as two's complement.
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Mask covering all bits of the width.
    pub const fn mask(self) -> u64 {
        match self.bit_width() {
            64 => u64::MAX,
            w => (1u64 << w) - 1,
        }
    }

    /// Number of hex digits of a full-width value.
    pub const fn hex_digits(self) -> usize {
        (self.bit_width() / 4) as usize
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ValueError::UnknownDataType(s.to_string()))
    }
}

/// Address of a single dictionary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DictionaryAddress {
    /// Object index.
    pub index: u16,
    /// Object subindex.
    pub subindex: u8,
    /// Declared entry type.
    pub data_type: DataType,
}

impl DictionaryAddress {
    /// Create an address.
    pub const fn new(index: u16, subindex: u8, data_type: DataType) -> Self {
        Self {
            index,
            subindex,
            data_type,
        }
    }

    /// Same entry, different declared type.
    pub const fn with_type(self, data_type: DataType) -> Self {
        Self { data_type, ..self }
    }
}

impl fmt::Display for DictionaryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:04x}:{:02x} [{}]",
            self.index, self.subindex, self.data_type
        )
    }
}

/// Parse a number using the tool's base convention.
///
/// `0x`/`0X` selects hexadecimal, a leading `0` octal, anything else decimal.
/// A leading `-` negates the result. Magnitudes above `u64::MAX` are rejected.
pub fn parse_number(text: &str) -> Result<i128, ValueError> {
    let invalid = || ValueError::InvalidNumber(text.to_string());
    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let (radix, digits) = if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        (16, hex)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };

    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(invalid());
    }

    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| invalid())?;
    let value = i128::from(magnitude);
    Ok(if negative { -value } else { value })
}

/// Parse a 16 bit object index.
pub fn parse_index(text: &str) -> Result<u16, ValueError> {
    parse_number(text)
        .ok()
        .and_then(|v| u16::try_from(v).ok())
        .ok_or_else(|| ValueError::InvalidIndex(text.to_string()))
}

/// Parse an 8 bit object subindex.
pub fn parse_subindex(text: &str) -> Result<u8, ValueError> {
    parse_number(text)
        .ok()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| ValueError::InvalidSubindex(text.to_string()))
}

/// Parse `text` and encode it as a raw word of `data_type`.
pub fn encode_value(text: &str, data_type: DataType) -> Result<u64, ValueError> {
    let value = parse_number(text)?;
    encode_number(value, data_type).ok_or_else(|| ValueError::OutOfRange {
        value: text.to_string(),
        data_type,
    })
}

/// Encode a number as a raw word of `data_type`.
///
/// Unsigned types accept `0..=mask`. Signed types additionally accept
/// negative values down to the type minimum, which are stored as two's
/// complement; non-negative input up to `mask` is taken as a raw bit pattern.
pub fn encode_number(value: i128, data_type: DataType) -> Option<u64> {
    let mask = i128::from(data_type.mask());
    let min = if data_type.is_signed() {
        -(1i128 << (data_type.bit_width() - 1))
    } else {
        0
    };
    if value < min || value > mask {
        return None;
    }
    // Truncating cast keeps the two's complement bits of negative values.
    Some((value as u64) & data_type.mask())
}

/// Interpret a raw word according to `data_type`.
pub fn decode_value(raw: u64, data_type: DataType) -> i128 {
    let raw = raw & data_type.mask();
    let width = data_type.bit_width();
    if data_type.is_signed() && (raw >> (width - 1)) & 1 == 1 {
        i128::from(raw) - (1i128 << width)
    } else {
        i128::from(raw)
    }
}

/// Format a raw value the way it travels to the download command:
/// `0x` followed by lowercase hex without padding.
pub fn format_hex(value: u64) -> String {
    format!("{value:#x}")
}

/// Format a 16 bit word with four hex digits, e.g. `0x006f`.
pub fn format_word(value: u16) -> String {
    format!("{value:#06x}")
}

/// Format a raw value padded to the full width of `data_type`.
pub fn format_padded(value: u64, data_type: DataType) -> String {
    format!(
        "0x{:0width$x}",
        value & data_type.mask(),
        width = data_type.hex_digits()
    )
}

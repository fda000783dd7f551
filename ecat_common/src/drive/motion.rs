//! Profile-position motion requests.
//!
//! Logical positions are signed; the drive receives the unsigned 32 bit
//! pattern. Reverse moves are encoded as the two's-complement negation of the
//! logical target, computed with wrapping arithmetic so every `i32` input has
//! a defined encoding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Target transmitted unchanged.
    #[default]
    Forward,
    /// Target transmitted negated.
    Reverse,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        })
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" | "fwd" | "right" | "+" => Ok(Self::Forward),
            "reverse" | "rev" | "left" | "-" => Ok(Self::Reverse),
            other => Err(format!("Invalid direction '{other}'")),
        }
    }
}

/// One profile-position move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionRequest {
    /// Logical target position.
    pub target_position: i32,
    /// Move direction.
    pub direction: Direction,
    /// Profile velocity.
    pub profile_velocity: u32,
}

impl MotionRequest {
    /// Target position word as transmitted to 0x607A.
    #[inline]
    pub const fn encoded_target(&self) -> u32 {
        encode_target(self.target_position, self.direction)
    }
}

/// Encode a logical target position for transmission.
///
/// `Reverse` yields `0xFFFFFFFF - target + 1` modulo 2^32.
#[inline]
pub const fn encode_target(target_position: i32, direction: Direction) -> u32 {
    let raw = target_position as u32;
    match direction {
        Direction::Forward => raw,
        Direction::Reverse => u32::MAX.wrapping_sub(raw).wrapping_add(1),
    }
}

//! Master, alias, position and domain selectors.
//!
//! A selector is either `-` (all) or a comma separated list of values and
//! ranges: `1,3`, `5-7,9`, `-3` (0 up to 3), `7-` (7 and above).

use crate::consts::SELECT_ALL;
use crate::od::types::parse_number;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

/// Selector parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid selector '{text}': {reason}")]
pub struct SelectorError {
    /// Selector as given.
    pub text: String,
    /// What is wrong with it.
    pub reason: String,
}

/// Parsed selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    /// Every value matches.
    #[default]
    All,
    /// Only values inside one of the ranges match.
    Ranges(Vec<RangeInclusive<u32>>),
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        let fail = |reason: &str| SelectorError {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = text.trim();
        if trimmed == SELECT_ALL {
            return Ok(Self::All);
        }
        if trimmed.is_empty() {
            return Err(fail("empty selector"));
        }

        let mut ranges = Vec::new();
        for part in trimmed.split(',').map(str::trim) {
            if part.is_empty() {
                return Err(fail("empty list element"));
            }
            let range = match part.split_once('-') {
                Some((first, last)) => {
                    let first = if first.is_empty() {
                        0
                    } else {
                        parse_u32(first).ok_or_else(|| fail("invalid range start"))?
                    };
                    let last = if last.is_empty() {
                        u32::MAX
                    } else {
                        parse_u32(last).ok_or_else(|| fail("invalid range end"))?
                    };
                    if first > last {
                        return Err(fail("range start exceeds range end"));
                    }
                    first..=last
                }
                None => {
                    let value = parse_u32(part).ok_or_else(|| fail("invalid number"))?;
                    value..=value
                }
            };
            ranges.push(range);
        }
        Ok(Self::Ranges(ranges))
    }

    /// Whether `value` is selected.
    pub fn matches(&self, value: u32) -> bool {
        match self {
            Self::All => true,
            Self::Ranges(ranges) => ranges.iter().any(|r| r.contains(&value)),
        }
    }

    /// The single concrete value this selector names, if any.
    pub fn single(&self) -> Option<u32> {
        match self {
            Self::Ranges(ranges) => match ranges.as_slice() {
                [only] if only.start() == only.end() => Some(*only.start()),
                _ => None,
            },
            Self::All => None,
        }
    }

    /// Whether this is the `-` selector.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(SELECT_ALL),
            Self::Ranges(ranges) => {
                let parts: Vec<String> = ranges
                    .iter()
                    .map(|r| match (*r.start(), *r.end()) {
                        (a, b) if a == b => a.to_string(),
                        (a, u32::MAX) => format!("{a}-"),
                        (a, b) => format!("{a}-{b}"),
                    })
                    .collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

fn parse_u32(text: &str) -> Option<u32> {
    parse_number(text).ok().and_then(|v| u32::try_from(v).ok())
}

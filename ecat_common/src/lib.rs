//! ECAT Common Library
//!
//! This crate provides the types shared by the ecat workspace crates:
//! object dictionary addressing, CiA 402 drive definitions, device selectors
//! and configuration loading.
//!
//! # Module Structure
//!
//! - [`od`] - Dictionary addresses, value encoding and the client seam
//! - [`drive`] - CiA 402 objects, control/status words, power states, motion
//! - [`selector`] - Master/alias/position selector parsing
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide constants
//!
//! # Usage
//!
//! ```rust
//! use ecat_common::od::types::{DataType, DictionaryAddress};
//! use ecat_common::drive::objects::CONTROL_WORD;
//!
//! assert_eq!(CONTROL_WORD.data_type, DataType::Uint16);
//! ```

pub mod config;
pub mod consts;
pub mod drive;
pub mod od;
pub mod selector;

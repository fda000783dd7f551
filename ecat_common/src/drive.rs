//! CiA 402 drive profile definitions.
//!
//! Dictionary objects, control/status word bits, the power state decoded from
//! the status word and the profile-position motion request.

pub mod motion;
pub mod objects;
pub mod state;
pub mod words;

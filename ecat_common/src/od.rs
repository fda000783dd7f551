//! Object dictionary access.
//!
//! This module contains the addressing and value encoding types and the
//! client trait through which every upload and download is performed.

pub mod client;
pub mod types;

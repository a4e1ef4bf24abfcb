//! Error handling for account sessions
//!
//! This module defines the error taxonomy and the crate-wide result alias.

pub mod types;

pub use types::{Error, Result};

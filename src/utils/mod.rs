//! Utility functions and helpers
//!
//! This module contains utility functions used throughout the application.

pub mod geo;
pub mod version;

pub use geo::{distance, in_radius};
pub use version::{VERSION, get_version};

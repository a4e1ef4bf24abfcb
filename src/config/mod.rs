//! Configuration management for account sessions
//!
//! This module handles loading and managing configuration settings
//! for the session orchestrator and the command line tool.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{LoggingSettings, ProxyDisplay, ProxyRotation, Settings};

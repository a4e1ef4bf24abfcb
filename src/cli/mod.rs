//! Command line entry points

pub mod session;

pub use session::{AccountSummary, SessionArgs, load_settings, log_filter, run_session_mode};

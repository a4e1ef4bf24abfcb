//! Pogom Session - account session orchestration
//!
//! Prepares accounts of a gameplay-protocol client for automated scanning.
//! Each account is logged in with bounded retries, its remote configuration
//! is synchronized through the server's paginated download protocol, and
//! any missing tutorial steps are completed, all paced like a human player.
//!
//! # Architecture
//!
//! - [`session::AuthController`]: ticket validation, login retries and the
//!   startup requests that follow a login
//! - [`session::ConfigSyncEngine`]: remote config version check and the
//!   asset digest / item template downloads
//! - [`session::TutorialSequencer`]: the tutorial steps a fresh account needs
//! - [`session::GameplayActions`]: spins and encounters for ready accounts
//! - [`session::merge`]: the only code that writes account state
//! - [`session::SessionOrchestrator`]: composes the above
//!
//! # Usage
//!
//! ```bash
//! pogom-session --mock-url http://127.0.0.1:9000 --username trainer --password secret
//! ```
//!
//! # Examples
//!
//! ```rust
//! use pogom_session::{SessionOrchestrator, Settings};
//! use pogom_session::session::HttpApiClient;
//! use std::sync::Arc;
//!
//! # fn example() -> anyhow::Result<()> {
//! let settings = Settings::default();
//! let client = Arc::new(HttpApiClient::new(
//!     "http://127.0.0.1:9000",
//!     std::time::Duration::from_secs(settings.api.timeout_secs),
//! )?);
//! let orchestrator = SessionOrchestrator::new(settings, client, None)?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod types;
pub mod utils;

pub use config::Settings;
pub use error::{Error, Result};
pub use session::SessionOrchestrator;
pub use types::{Account, AuthService, SessionStatus};

//! Account session lifecycle
//!
//! This module drives an account from credentials to a scan-ready session:
//! login with bounded retries, paginated remote config sync, tutorial
//! completion, and the gameplay requests used afterwards. All traffic goes
//! through the [`ApiClient`] seam and every pause goes through a
//! cancellable [`Pacer`].

pub mod actions;
pub mod auth;
pub mod client;
pub mod config_sync;
pub mod manager;
pub mod merge;
pub mod network;
pub mod pacing;
pub mod retry;
pub mod tutorial;

#[cfg(test)]
pub(crate) mod test_support;

pub use actions::{GameplayActions, SpinOutcome};
pub use auth::{AuthController, AuthOutcome};
pub use client::{ApiClient, HttpApiClient};
pub use config_sync::{ConfigSyncEngine, PageKind, PageResult, PaginationCursor, SyncReport};
pub use manager::{HttpSessionOrchestrator, SessionOrchestrator, SessionReady};
pub use network::{ProxyAssignment, ProxyConfig, ProxyPool, ProxyProvider};
pub use pacing::{BurstPacer, DelayRange, Pacer, PacingPolicy};
pub use retry::{RetryError, RetryPolicy, retry};
pub use tutorial::TutorialSequencer;

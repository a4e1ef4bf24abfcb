//! Type definitions for account sessions
//!
//! This module contains the account model plus the typed request and
//! response structures exchanged with the API client.

pub mod account;
pub mod request;
pub mod response;
pub mod serde_helpers;

pub use account::{
    Account, AuthService, Credentials, Fort, FortKind, Location, RemoteConfig, SessionStatus,
    TutorialState,
};
pub use request::{Operation, PlayerAvatar, PlayerLocale, RequestEnvelope};
pub use response::{PageResponse, Response, Responses};

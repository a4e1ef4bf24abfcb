//! Error type definitions
//!
//! Defines the error taxonomy shared by every session phase.

use thiserror::Error;

/// Main error type for account sessions
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials were rejected by the authentication provider
    #[error("Authentication rejected: {0}")]
    Auth(String),

    /// Login kept failing after every allowed attempt
    #[error("Exceeded login attempts for account {username} ({attempts} tries)")]
    TooManyLoginAttempts { username: String, attempts: u32 },

    /// A scripted multi-step exchange failed part way through
    #[error("Login sequence failed during {stage}: {source}")]
    Sequence {
        stage: String,
        #[source]
        source: Box<Error>,
    },

    /// A continuation protocol never returned a terminal page
    #[error("Pagination for {operation} exceeded {pages} pages")]
    PaginationExhausted { operation: String, pages: u32 },

    /// An isolated gameplay request failed
    #[error("Request failed: {0}")]
    Request(String),

    /// The server asked for a captcha to be solved
    #[error("Challenge required: {url}")]
    ChallengeRequired { url: String },

    /// The server reports the account as banned
    #[error("Account {username} is banned")]
    AccountBanned { username: String },

    /// Transport level failures reported by the API client
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response did not carry a payload the caller relies on
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Proxy configuration errors
    #[error("Proxy error: {config}")]
    Proxy { config: String },

    /// The session was cancelled while suspended
    #[error("Session cancelled")]
    Cancelled,

    /// Network/HTTP client errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new authentication rejection
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Wrap `source` as a failure of the scripted `stage`.
    ///
    /// Terminal conditions that already carry their own meaning (cancellation,
    /// pagination exhaustion, login exhaustion and nested sequence failures)
    /// are returned unchanged.
    pub fn sequence(stage: impl Into<String>, source: Error) -> Self {
        match source {
            Self::Cancelled
            | Self::PaginationExhausted { .. }
            | Self::TooManyLoginAttempts { .. }
            | Self::Sequence { .. } => source,
            other => Self::Sequence {
                stage: stage.into(),
                source: Box::new(other),
            },
        }
    }

    /// Create a request failure
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a proxy error
    pub fn proxy(config: impl Into<String>) -> Self {
        Self::Proxy {
            config: config.into(),
        }
    }

    /// Whether this error is a credential rejection worth retrying
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

//! Account and per-session state
//!
//! The account record is owned by one session at a time; the merge
//! functions in [`crate::session::merge`] are its only mutators during a
//! session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tutorial steps that must be completed before an account can scan
pub const REQUIRED_TUTORIAL_STEPS: [u32; 5] = [0, 1, 3, 4, 7];

/// Authentication provider of an account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthService {
    /// Trainer club login
    #[default]
    Ptc,
    /// Google account login
    Google,
}

impl AuthService {
    /// Provider name as the authentication endpoint expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ptc => "ptc",
            Self::Google => "google",
        }
    }
}

impl std::str::FromStr for AuthService {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ptc" => Ok(Self::Ptc),
            "google" => Ok(Self::Google),
            other => Err(crate::Error::config(format!("Unknown auth service: {}", other))),
        }
    }
}

/// Server-reported set of completed tutorial steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TutorialState(BTreeSet<u32>);

impl TutorialState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, step: u32) -> bool {
        self.0.contains(&step)
    }

    /// Whether every step required for scanning is done
    pub fn is_complete(&self) -> bool {
        REQUIRED_TUTORIAL_STEPS.iter().all(|step| self.0.contains(step))
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<u32> for TutorialState {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fingerprint of the last synchronized remote config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Settings hash echoed back in download settings requests
    pub hash: String,
    /// Asset digest timestamp, in seconds
    pub asset_time: f64,
    /// Item templates timestamp, in seconds
    pub template_time: f64,
}

/// Credentials handed to the API client
#[derive(Debug, Clone)]
pub struct Credentials {
    pub provider: AuthService,
    pub username: String,
    pub password: String,
}

/// An account driven through the session lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub auth_service: AuthService,
    /// Player level, never lowered
    #[serde(default)]
    pub level: u32,
    /// Inventory high-water mark in milliseconds, never lowered
    #[serde(default)]
    pub last_timestamp_ms: i64,
    #[serde(default)]
    pub tutorial_state: TutorialState,
    #[serde(default)]
    pub remote_config: Option<RemoteConfig>,
    #[serde(default)]
    pub warned: bool,
    #[serde(default)]
    pub banned: bool,
}

impl Account {
    /// Create a fresh account record
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        auth_service: AuthService,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            auth_service,
            level: 0,
            last_timestamp_ms: 0,
            tutorial_state: TutorialState::new(),
            remote_config: None,
            warned: false,
            banned: false,
        }
    }

    /// Credentials for [`crate::session::ApiClient::set_authentication`]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            provider: self.auth_service,
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// Hash of the last committed remote config, if any
    pub fn config_hash(&self) -> Option<&str> {
        self.remote_config.as_ref().map(|c| c.hash.as_str())
    }
}

/// Proxy bookkeeping for one account's session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Proxy URL currently used by the account
    pub proxy_url: Option<String>,
    /// What to show for the proxy in status output
    pub proxy_display: Option<String>,
}

impl SessionStatus {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Kind of a point of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FortKind {
    Gym,
    Pokestop,
}

/// A point of interest on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fort {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: FortKind,
}

impl Fort {
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account() {
        let account = Account::new("trainer", "secret", AuthService::Ptc);
        assert_eq!(account.level, 0);
        assert_eq!(account.last_timestamp_ms, 0);
        assert!(account.remote_config.is_none());
        assert!(account.config_hash().is_none());
        assert!(!account.warned && !account.banned);
    }

    #[test]
    fn test_tutorial_completion() {
        let partial: TutorialState = [0, 1, 3].into_iter().collect();
        assert!(!partial.is_complete());

        let full: TutorialState = [0, 1, 3, 4, 7, 8].into_iter().collect();
        assert!(full.is_complete());
        assert!(full.contains(8));
    }

    #[test]
    fn test_auth_service_parsing() {
        assert_eq!("PTC".parse::<AuthService>().unwrap(), AuthService::Ptc);
        assert_eq!("google".parse::<AuthService>().unwrap(), AuthService::Google);
        assert!("facebook".parse::<AuthService>().is_err());
    }

    #[test]
    fn test_account_deserializes_with_defaults() {
        let json = serde_json::json!({
            "username": "trainer",
            "password": "secret",
            "auth_service": "google",
            "tutorial_state": [0, 1]
        });
        let account: Account = serde_json::from_value(json).unwrap();

        assert_eq!(account.auth_service, AuthService::Google);
        assert!(account.tutorial_state.contains(1));
        assert_eq!(account.level, 0);
    }
}

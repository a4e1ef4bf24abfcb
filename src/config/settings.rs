//! Configuration settings structure
//!
//! Defines the main settings structure and loading logic for account sessions.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Longest accepted wait between login attempts, in seconds
pub const MAX_LOGIN_DELAY_SECS: f64 = 3600.0;

/// Largest accepted pacing multiplier
pub const MAX_PACING_SCALE: f64 = 100.0;

/// Main configuration settings for account sessions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Remote API configuration
    pub api: ApiSettings,
    /// Login retry configuration
    pub login: LoginSettings,
    /// Proxy assignment configuration
    pub proxy: ProxySettings,
    /// Human-like pacing configuration
    pub pacing: PacingSettings,
    /// Remote config synchronization
    pub sync: SyncSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Game client version the requests pretend to come from
    pub version: String,
    /// Base URL of a JSON mock server
    pub mock_url: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Login retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginSettings {
    /// Retries after the first failed attempt
    pub retries: u32,
    /// Seconds to wait between attempts
    pub delay_secs: f64,
}

/// Proxy assignment configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Proxy URLs available to sessions
    pub urls: Vec<String>,
    /// How a new proxy is picked
    pub rotation: ProxyRotation,
    /// How the assigned proxy is shown in status output
    pub display: ProxyDisplay,
}

/// Proxy rotation strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyRotation {
    /// Keep the first proxy assigned to an account
    #[default]
    None,
    /// Walk the proxy list in order
    #[serde(rename = "round")]
    RoundRobin,
    /// Pick a random proxy each time
    Random,
}

impl FromStr for ProxyRotation {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "round" | "round-robin" => Ok(Self::RoundRobin),
            "random" => Ok(Self::Random),
            other => Err(crate::Error::config(format!(
                "Invalid proxy rotation: {}",
                other
            ))),
        }
    }
}

/// How the assigned proxy is displayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyDisplay {
    /// Show the proxy's position in the pool
    #[default]
    Index,
    /// Show the full proxy URL
    Full,
}

impl FromStr for ProxyDisplay {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        if s.trim().eq_ignore_ascii_case("full") {
            Ok(Self::Full)
        } else {
            Ok(Self::Index)
        }
    }
}

/// Pacing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    /// Multiplier applied to every sampled delay
    pub scale: f64,
}

/// Remote config synchronization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Upper bound on pages fetched by one continuation loop
    pub max_pages: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level
    pub level: String,
    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            version: "0.57.2".to_string(),
            mock_url: None,
            timeout_secs: 30,
        }
    }
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            retries: 3,
            delay_secs: 6.0,
        }
    }
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { max_pages: 200 }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            verbose: false,
        }
    }
}

impl ApiSettings {
    /// Numeric app version sent with config requests.
    ///
    /// `0.57.2` becomes `5702`: every dot is replaced by a zero.
    pub fn app_version(&self) -> crate::Result<u32> {
        self.version
            .replace('.', "0")
            .parse()
            .map_err(|e| crate::Error::config(format!("Invalid API version {}: {}", self.version, e)))
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Self::default().merge_with_env()
    }

    /// Override fields with any `POGOM_*` environment variables that are set
    pub fn merge_with_env(mut self) -> crate::Result<Self> {
        if let Ok(version) = std::env::var("POGOM_API_VERSION") {
            self.api.version = version;
        }

        if let Ok(url) = std::env::var("POGOM_MOCK_URL") {
            self.api.mock_url = Some(url);
        }

        if let Ok(retries) = std::env::var("POGOM_LOGIN_RETRIES") {
            self.login.retries = retries
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid login retries: {}", e)))?;
        }

        if let Ok(delay) = std::env::var("POGOM_LOGIN_DELAY") {
            self.login.delay_secs = delay
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid login delay: {}", e)))?;
        }

        if let Ok(proxies) = std::env::var("POGOM_PROXY") {
            self.proxy.urls = proxies
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        if let Ok(rotation) = std::env::var("POGOM_PROXY_ROTATION") {
            self.proxy.rotation = rotation.parse()?;
        }

        if let Ok(display) = std::env::var("POGOM_PROXY_DISPLAY") {
            self.proxy.display = display.parse()?;
        }

        if let Ok(scale) = std::env::var("POGOM_PACING_SCALE") {
            self.pacing.scale = scale
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid pacing scale: {}", e)))?;
        }

        if let Ok(pages) = std::env::var("POGOM_MAX_PAGES") {
            self.sync.max_pages = pages
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid max pages: {}", e)))?;
        }

        Ok(self)
    }

    /// Reject settings the session could not run with
    pub fn validate(&self) -> crate::Result<()> {
        self.api.app_version()?;

        if !(0.0..=MAX_LOGIN_DELAY_SECS).contains(&self.login.delay_secs) {
            return Err(crate::Error::config(format!(
                "Login delay must be between 0 and {} seconds",
                MAX_LOGIN_DELAY_SECS
            )));
        }

        if !(0.0..=MAX_PACING_SCALE).contains(&self.pacing.scale) {
            return Err(crate::Error::config(format!(
                "Pacing scale must be between 0 and {}",
                MAX_PACING_SCALE
            )));
        }

        if self.sync.max_pages == 0 {
            return Err(crate::Error::config("Max pages must be at least 1"));
        }

        if let Some(mock_url) = &self.api.mock_url {
            url::Url::parse(mock_url)?;
        }

        for proxy in &self.proxy.urls {
            url::Url::parse(proxy)
                .map_err(|e| crate::Error::proxy(format!("{}: {}", proxy, e)))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.api.version, "0.57.2");
        assert_eq!(settings.login.retries, 3);
        assert_eq!(settings.login.delay_secs, 6.0);
        assert_eq!(settings.proxy.rotation, ProxyRotation::None);
        assert_eq!(settings.sync.max_pages, 200);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_app_version() {
        let mut settings = Settings::new();
        assert_eq!(settings.api.app_version().unwrap(), 5702);

        settings.api.version = "0.63.1".to_string();
        assert_eq!(settings.api.app_version().unwrap(), 6301);

        settings.api.version = "latest".to_string();
        assert!(settings.api.app_version().is_err());
    }

    #[test]
    fn test_rotation_parsing() {
        assert_eq!("none".parse::<ProxyRotation>().unwrap(), ProxyRotation::None);
        assert_eq!("Round".parse::<ProxyRotation>().unwrap(), ProxyRotation::RoundRobin);
        assert_eq!("random".parse::<ProxyRotation>().unwrap(), ProxyRotation::Random);
        assert!("sometimes".parse::<ProxyRotation>().is_err());
    }

    #[test]
    fn test_display_parsing() {
        assert_eq!("FULL".parse::<ProxyDisplay>().unwrap(), ProxyDisplay::Full);
        assert_eq!("index".parse::<ProxyDisplay>().unwrap(), ProxyDisplay::Index);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.sync.max_pages = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.pacing.scale = -1.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.pacing.scale = f64::INFINITY;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.login.delay_secs = 1e20;
        assert!(matches!(settings.validate(), Err(crate::Error::Config(_))));

        let mut settings = Settings::default();
        settings.login.delay_secs = f64::NAN;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.proxy.urls = vec!["not a proxy".to_string()];
        assert!(matches!(settings.validate(), Err(crate::Error::Proxy { .. })));
    }

    #[test]
    fn test_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
[login]
retries = 5
"#,
        )
        .unwrap();

        assert_eq!(settings.login.retries, 5);
        assert_eq!(settings.login.delay_secs, 6.0);
        assert_eq!(settings.api.version, "0.57.2");
    }
}

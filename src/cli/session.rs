//! Session mode CLI logic
//!
//! Loads configuration, prepares one account against a mock server and
//! returns a summary the binary prints as JSON.

use crate::config::{ConfigLoader, LoggingSettings};
use crate::session::{HttpApiClient, ProxyPool, ProxyProvider, SessionOrchestrator, SessionReady};
use crate::types::{Account, AuthService, RemoteConfig, SessionStatus};
use crate::{Settings, utils::version};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Arguments for session mode
#[derive(Debug, Clone)]
pub struct SessionArgs {
    pub config: Option<PathBuf>,
    pub username: String,
    pub password: String,
    pub auth_service: AuthService,
    pub mock_url: Option<String>,
    pub proxies: Vec<String>,
}

/// What the binary prints once an account is ready
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    #[serde(flatten)]
    pub ready: SessionReady,
    pub last_timestamp_ms: i64,
    pub remote_config: Option<RemoteConfig>,
}

/// Load settings and apply command line overrides on top
pub fn load_settings(args: &SessionArgs) -> Result<Settings> {
    let path = args.config.clone().or_else(ConfigLoader::default_config_path);
    let mut settings = ConfigLoader::new().load(path.as_deref())?;

    if let Some(url) = &args.mock_url {
        settings.api.mock_url = Some(url.clone());
    }
    if !args.proxies.is_empty() {
        settings.proxy.urls = args.proxies.clone();
    }

    settings.validate()?;
    Ok(settings)
}

/// Default tracing filter when `RUST_LOG` is unset.
///
/// `--verbose` wins, then the `[logging]` section, then `info`.
pub fn log_filter(verbose: bool, logging: Option<&LoggingSettings>) -> String {
    match logging {
        _ if verbose => "debug".to_string(),
        Some(logging) if logging.verbose => "debug".to_string(),
        Some(logging) => logging.level.clone(),
        None => "info".to_string(),
    }
}

/// Proxy pool for the configured proxies, if any
pub fn proxy_provider(settings: &Settings) -> Option<Arc<dyn ProxyProvider>> {
    if settings.proxy.urls.is_empty() {
        return None;
    }
    let pool = ProxyPool::new(settings.proxy.urls.clone(), settings.proxy.rotation);
    Some(Arc::new(pool))
}

/// Run session mode with the given arguments and settings from [`load_settings`]
pub async fn run_session_mode(args: SessionArgs, settings: Settings) -> Result<AccountSummary> {
    let mock_url = settings
        .api
        .mock_url
        .clone()
        .context("No API endpoint configured; pass --mock-url or set POGOM_MOCK_URL")?;

    tracing::info!(
        "Starting pogom-session v{} against {}",
        version::get_version(),
        mock_url
    );

    let client = Arc::new(HttpApiClient::new(
        &mock_url,
        Duration::from_secs(settings.api.timeout_secs),
    )?);
    let provider = proxy_provider(&settings);
    let orchestrator = SessionOrchestrator::new(settings, client, provider)?;

    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling session");
            cancel.cancel();
        }
    });

    let mut account = Account::new(&args.username, &args.password, args.auth_service);
    let mut status = SessionStatus::new();

    let ready = orchestrator
        .prepare(&mut account, &mut status)
        .await
        .with_context(|| format!("Failed to prepare account {}", args.username))?;

    tracing::info!(
        "Account {} is ready (level {}).",
        ready.username,
        ready.level
    );

    Ok(AccountSummary {
        ready,
        last_timestamp_ms: account.last_timestamp_ms,
        remote_config: account.remote_config,
    })
}

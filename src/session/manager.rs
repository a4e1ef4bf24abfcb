//! # Session Orchestration
//!
//! [`SessionOrchestrator`] takes one account from "just credentials" to
//! "ready to scan". It composes the session phases:
//!
//! 1. proxy assignment through the optional [`ProxyProvider`]
//! 2. login through [`AuthController`]
//! 3. remote config sync through [`ConfigSyncEngine`]
//! 4. player profile and level-up reward checks
//! 5. tutorial completion through [`TutorialSequencer`]
//!
//! Steps 3 and 4 only run after a fresh login; a session whose ticket is
//! still valid goes straight to the tutorial check.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use pogom_session::config::Settings;
//! use pogom_session::session::{HttpApiClient, SessionOrchestrator};
//! use pogom_session::types::{Account, AuthService, SessionStatus};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let client = Arc::new(HttpApiClient::new("http://127.0.0.1:9000", Duration::from_secs(30))?);
//! let orchestrator = SessionOrchestrator::new(Settings::default(), client, None)?;
//!
//! let mut account = Account::new("trainer", "secret", AuthService::Ptc);
//! let mut status = SessionStatus::new();
//! let ready = orchestrator.prepare(&mut account, &mut status).await?;
//! println!("Account is level {}", ready.level);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! ## Cancellation
//!
//! Every pause and network call of a session races the orchestrator's
//! [`CancellationToken`]. Cancelling makes the running phase return
//! [`Error::Cancelled`]; state merged by earlier steps is kept.

use crate::config::{ProxyDisplay, ProxyRotation, Settings};
use crate::session::actions::GameplayActions;
use crate::session::auth::{AuthController, AuthOutcome};
use crate::session::client::{ApiClient, HttpApiClient};
use crate::session::config_sync::{ConfigSyncEngine, SyncReport};
use crate::session::network::{ProxyConfig, ProxyProvider};
use crate::session::pacing::{self, Pacer, PacingPolicy};
use crate::session::retry::RetryPolicy;
use crate::session::tutorial::TutorialSequencer;
use crate::session::merge;
use crate::types::{Account, Operation, RequestEnvelope, SessionStatus};
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Orchestrator talking to a JSON mock server
pub type HttpSessionOrchestrator = SessionOrchestrator<HttpApiClient>;

/// Summary of an account that is ready to scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReady {
    pub username: String,
    pub level: u32,
    pub tutorial_complete: bool,
    pub warned: bool,
    /// Whether this run performed a fresh login
    pub logged_in: bool,
    /// Pages downloaded by the remote config sync, if one ran
    pub sync: Option<SyncReport>,
    /// Proxy shown for the account, if any
    pub proxy: Option<String>,
}

/// Drives one account's client through the session lifecycle
#[derive(Debug)]
pub struct SessionOrchestrator<C: ApiClient + ?Sized> {
    /// Configuration settings
    settings: Arc<Settings>,
    /// Client shared by every phase
    client: Arc<C>,
    /// Source of proxies, shared across sessions
    proxy_provider: Option<Arc<dyn ProxyProvider>>,
    /// Cancels every pause and call of this session
    cancel: CancellationToken,
    pacer: Pacer,
    auth: AuthController<C>,
    sync: ConfigSyncEngine<C>,
    tutorial: TutorialSequencer<C>,
    actions: GameplayActions<C>,
}

impl<C: ApiClient + ?Sized> SessionOrchestrator<C> {
    /// Create an orchestrator for `client`.
    ///
    /// # Errors
    ///
    /// Fails when [`Settings::validate`] rejects `settings`, for example
    /// when the API version is not a dotted number or a delay is out of range.
    pub fn new(
        settings: Settings,
        client: Arc<C>,
        proxy_provider: Option<Arc<dyn ProxyProvider>>,
    ) -> Result<Self> {
        settings.validate()?;
        let app_version = settings.api.app_version()?;
        let cancel = CancellationToken::new();
        let pacer = Pacer::new(PacingPolicy::new(settings.pacing.scale), cancel.clone());
        let retry = RetryPolicy::with_retries(settings.login.retries, settings.login.delay_secs);

        Ok(Self {
            auth: AuthController::new(client.clone(), pacer.clone(), retry),
            sync: ConfigSyncEngine::new(
                client.clone(),
                pacer.clone(),
                app_version,
                settings.sync.max_pages,
            ),
            tutorial: TutorialSequencer::new(client.clone(), pacer.clone()),
            actions: GameplayActions::new(client.clone(), pacer.clone()),
            settings: Arc::new(settings),
            client,
            proxy_provider,
            cancel,
            pacer,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Gameplay requests for the prepared account
    pub fn actions(&self) -> &GameplayActions<C> {
        &self.actions
    }

    /// Token cancelling this session; clone it to cancel from another task
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Abort whatever the session is waiting on
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Bring `account` to a state where it can scan.
    ///
    /// # Errors
    ///
    /// - [`Error::TooManyLoginAttempts`] when login keeps being rejected
    /// - [`Error::Sequence`] when a scripted step fails
    /// - [`Error::PaginationExhausted`] when a download never ends
    /// - [`Error::AccountBanned`] when the server flags the account
    /// - [`Error::Cancelled`] after [`SessionOrchestrator::cancel`]
    pub async fn prepare(
        &self,
        account: &mut Account,
        status: &mut SessionStatus,
    ) -> Result<SessionReady> {
        self.assign_proxy(status).await?;

        let outcome = self.auth.ensure_authenticated(account, status).await?;
        let mut sync = None;

        if outcome == AuthOutcome::LoggedIn {
            sync = Some(self.sync.sync_remote_config(account).await?);
            self.profile_and_rewards(account).await?;

            debug!("Login for account {} successful.", account.username);
            self.pacer.pause(pacing::AFTER_LOGIN).await?;
        }

        if !account.tutorial_state.is_complete() {
            info!("Completing tutorial steps for {}.", account.username);
            let state = account.tutorial_state.clone();
            self.tutorial.complete_tutorial(account, &state).await?;
        } else {
            debug!("Account {} already completed the tutorial.", account.username);
        }

        if account.banned {
            warn!("Account {} is marked as banned.", account.username);
            return Err(Error::AccountBanned {
                username: account.username.clone(),
            });
        }
        if account.warned {
            warn!("Account {} has a warning flag.", account.username);
        }

        Ok(SessionReady {
            username: account.username.clone(),
            level: account.level,
            tutorial_complete: account.tutorial_state.is_complete(),
            warned: account.warned,
            logged_in: outcome == AuthOutcome::LoggedIn,
            sync,
            proxy: status.proxy_display.clone(),
        })
    }

    /// Assign a proxy when the account has none or rotation is enabled,
    /// then route the client through the account's proxy.
    async fn assign_proxy(&self, status: &mut SessionStatus) -> Result<()> {
        if let Some(provider) = &self.proxy_provider
            && (status.proxy_url.is_none() || self.settings.proxy.rotation != ProxyRotation::None)
        {
            let assignment = self.pacer.run(provider.get_proxy()).await?;
            status.proxy_display = Some(match self.settings.proxy.display {
                ProxyDisplay::Full => assignment.url.clone(),
                ProxyDisplay::Index => assignment.identifier,
            });
            status.proxy_url = Some(assignment.url);
        }

        if let Some(url) = &status.proxy_url {
            debug!(
                "Using proxy {}",
                status.proxy_display.as_deref().unwrap_or(url)
            );
            self.client.set_proxy(ProxyConfig::uniform(url.clone()))?;
        }

        Ok(())
    }

    async fn profile_and_rewards(&self, account: &mut Account) -> Result<()> {
        let request = RequestEnvelope::new()
            .with(Operation::GetPlayerProfile)
            .with_config_calls(account.last_timestamp_ms, account.config_hash())
            .with_buddy_walked();
        let response = self
            .pacer
            .run(self.client.call(request))
            .await
            .map_err(|e| Error::sequence("get_player_profile", e))?;
        merge::merge_inventory(account, &response);
        self.pacer.pause(pacing::AFTER_PLAYER_PROFILE).await?;

        let request = RequestEnvelope::new()
            .with(Operation::LevelUpRewards {
                level: account.level,
            })
            .with_config_calls(account.last_timestamp_ms, account.config_hash())
            .with_buddy_walked()
            .with_inbox();
        let response = self
            .pacer
            .run(self.client.call(request))
            .await
            .map_err(|e| Error::sequence("level_up_rewards", e))?;
        merge::merge_inventory(account, &response);
        self.pacer.pause(pacing::AFTER_LEVEL_UP_REWARDS).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::network::ProxyPool;
    use crate::session::test_support::{CountingProxyProvider, ScriptedClient};
    use crate::types::AuthService;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.pacing.scale = 0.0;
        settings.login.delay_secs = 0.0;
        settings
    }

    fn account() -> Account {
        Account::new("trainer", "secret", AuthService::Ptc)
    }

    fn finished_player() -> serde_json::Value {
        json!({"responses": {"GET_PLAYER": {
            "player_data": {"tutorial_state": [0, 1, 3, 4, 7]}
        }}})
    }

    fn orchestrator(
        client: &Arc<ScriptedClient>,
        settings: Settings,
        provider: Option<Arc<dyn ProxyProvider>>,
    ) -> SessionOrchestrator<ScriptedClient> {
        SessionOrchestrator::new(settings, client.clone(), provider).unwrap()
    }

    #[tokio::test]
    async fn test_fresh_login_lifecycle() {
        let client = Arc::new(
            ScriptedClient::new()
                .respond_empty()
                .respond(finished_player())
                .respond(json!({"responses": {
                    "DOWNLOAD_REMOTE_CONFIG_VERSION": {
                        "asset_digest_timestamp_ms": 1_000_000,
                        "item_templates_timestamp_ms": 0
                    },
                    "DOWNLOAD_SETTINGS": {"hash": "h1"}
                }}))
                .respond(json!({"responses": {"GET_ASSET_DIGEST": {"result": 1}}})),
        );
        let mut account = account();
        let mut status = SessionStatus::new();

        let ready = orchestrator(&client, settings(), None)
            .prepare(&mut account, &mut status)
            .await
            .unwrap();

        assert!(ready.logged_in);
        assert!(ready.tutorial_complete);
        assert_eq!(
            ready.sync,
            Some(SyncReport {
                asset_pages: 1,
                template_pages: 0
            })
        );

        let names: Vec<&str> = client
            .requests()
            .iter()
            .map(|request| request.names().first().copied().unwrap_or("<empty>"))
            .collect();
        assert_eq!(
            names,
            vec![
                "<empty>",
                "GET_PLAYER",
                "DOWNLOAD_REMOTE_CONFIG_VERSION",
                "GET_ASSET_DIGEST",
                "GET_PLAYER_PROFILE",
                "LEVEL_UP_REWARDS",
            ]
        );

        let rewards = &client.requests()[5];
        assert!(rewards.contains("GET_INBOX"));
        assert!(rewards.operations.contains(&Operation::DownloadSettings {
            hash: Some("h1".to_string())
        }));
        assert!(client.requests()[4].contains("GET_BUDDY_WALKED"));
        assert!(!client.requests()[4].contains("GET_INBOX"));
    }

    #[tokio::test]
    async fn test_valid_ticket_goes_straight_to_tutorial_check() {
        let client = Arc::new(ScriptedClient::new().with_ticket(Utc::now() + Duration::hours(1)));
        let mut account = account();
        account.tutorial_state = [0, 1, 3, 4, 7].into_iter().collect();

        let ready = orchestrator(&client, settings(), None)
            .prepare(&mut account, &mut SessionStatus::new())
            .await
            .unwrap();

        assert!(!ready.logged_in);
        assert!(ready.sync.is_none());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_incomplete_tutorial_runs() {
        let client = Arc::new(ScriptedClient::new().with_ticket(Utc::now() + Duration::hours(1)));
        let mut account = account();
        account.tutorial_state = [0, 1, 3, 4].into_iter().collect();

        orchestrator(&client, settings(), None)
            .prepare(&mut account, &mut SessionStatus::new())
            .await
            .unwrap();

        assert_eq!(client.requests_with("MARK_TUTORIAL_COMPLETE").len(), 1);
    }

    #[tokio::test]
    async fn test_banned_account_is_reported() {
        let client = Arc::new(
            ScriptedClient::new()
                .respond_empty()
                .respond(json!({"responses": {"GET_PLAYER": {
                    "player_data": {"tutorial_state": [0, 1, 3, 4, 7]},
                    "banned": true
                }}})),
        );
        let mut account = account();

        let result = orchestrator(&client, settings(), None)
            .prepare(&mut account, &mut SessionStatus::new())
            .await;

        assert!(matches!(result, Err(Error::AccountBanned { username }) if username == "trainer"));
        assert!(account.banned);
    }

    #[tokio::test]
    async fn test_profile_failure_is_sequence_failure() {
        let client = Arc::new(
            ScriptedClient::new()
                .respond_empty()
                .respond(finished_player())
                .respond_empty()
                .fail(Error::transport("connection reset")),
        );

        let result = orchestrator(&client, settings(), None)
            .prepare(&mut account(), &mut SessionStatus::new())
            .await;

        match result {
            Err(Error::Sequence { stage, .. }) => assert_eq!(stage, "get_player_profile"),
            other => panic!("expected sequence failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_proxy_assigned_once_without_rotation() {
        let client = Arc::new(ScriptedClient::new().with_ticket(Utc::now() + Duration::hours(1)));
        let provider = Arc::new(CountingProxyProvider::default());
        let session = orchestrator(&client, settings(), Some(provider.clone()));
        let mut account = account();
        account.tutorial_state = [0, 1, 3, 4, 7].into_iter().collect();
        let mut status = SessionStatus::new();

        session.prepare(&mut account, &mut status).await.unwrap();
        session.prepare(&mut account, &mut status).await.unwrap();

        assert_eq!(provider.handed_out(), 1);
        assert_eq!(status.proxy_url.as_deref(), Some("http://proxy-0:8080"));
        assert_eq!(status.proxy_display.as_deref(), Some("0"));
        assert_eq!(
            client.proxies(),
            vec![ProxyConfig::uniform("http://proxy-0:8080"); 2]
        );
    }

    #[tokio::test]
    async fn test_proxy_rotation_and_full_display() {
        let client = Arc::new(ScriptedClient::new().with_ticket(Utc::now() + Duration::hours(1)));
        let mut settings = settings();
        settings.proxy.rotation = ProxyRotation::RoundRobin;
        settings.proxy.display = ProxyDisplay::Full;
        let pool = Arc::new(ProxyPool::new(
            vec!["http://a:1".to_string(), "http://b:2".to_string()],
            ProxyRotation::RoundRobin,
        ));
        let session = orchestrator(&client, settings, Some(pool));
        let mut account = account();
        account.tutorial_state = [0, 1, 3, 4, 7].into_iter().collect();
        let mut status = SessionStatus::new();

        let first = session.prepare(&mut account, &mut status).await.unwrap();
        let second = session.prepare(&mut account, &mut status).await.unwrap();

        assert_eq!(first.proxy.as_deref(), Some("http://a:1"));
        assert_eq!(second.proxy.as_deref(), Some("http://b:2"));
    }

    #[tokio::test]
    async fn test_cancelled_session() {
        let client = Arc::new(ScriptedClient::new());
        let session = orchestrator(&client, settings(), None);
        let mut account = account();

        session.cancel();
        assert!(session.cancellation_token().is_cancelled());

        let result = session.prepare(&mut account, &mut SessionStatus::new()).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(client.call_count(), 0);
        assert!(account.remote_config.is_none());
    }

    #[test]
    fn test_invalid_api_version() {
        let mut settings = settings();
        settings.api.version = "latest".to_string();
        let client = Arc::new(ScriptedClient::new());

        let result = SessionOrchestrator::new(settings, client, None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_out_of_range_pacing_is_rejected() {
        let client = Arc::new(ScriptedClient::new());

        let mut infinite = settings();
        infinite.pacing.scale = f64::INFINITY;
        let result = SessionOrchestrator::new(infinite, client.clone(), None);
        assert!(matches!(result, Err(Error::Config(_))));

        let mut slow_login = settings();
        slow_login.login.delay_secs = 1e20;
        let result = SessionOrchestrator::new(slow_login, client, None);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

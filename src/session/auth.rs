//! Credential management and the login handshake
//!
//! [`AuthController`] keeps an account logged in: it reuses a ticket that
//! is still comfortably valid, retries rejected logins a bounded number of
//! times, and after a fresh login mimics the first requests the game client
//! makes on startup.

use crate::session::client::ApiClient;
use crate::session::merge;
use crate::session::network::ProxyConfig;
use crate::session::pacing::{self, Pacer};
use crate::session::retry::{RetryError, RetryPolicy, retry};
use crate::types::{Account, Operation, RequestEnvelope, SessionStatus};
use crate::{Error, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Tickets closer than this to expiry are renewed
const MIN_TICKET_LIFETIME_SECS: i64 = 60;

/// How [`AuthController::ensure_authenticated`] got to a valid session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The existing ticket was still valid; nothing was sent
    AlreadyValid,
    /// A new login and the startup requests were performed
    LoggedIn,
}

/// Establishes and validates credentials for one account's client
#[derive(Debug)]
pub struct AuthController<C: ApiClient + ?Sized> {
    client: Arc<C>,
    pacer: Pacer,
    policy: RetryPolicy,
}

impl<C: ApiClient + ?Sized> AuthController<C> {
    pub fn new(client: Arc<C>, pacer: Pacer, policy: RetryPolicy) -> Self {
        Self {
            client,
            pacer,
            policy,
        }
    }

    /// Whether the client's ticket outlives the renewal margin
    pub fn credentials_valid(&self) -> bool {
        match self.client.ticket_expiry() {
            Some(expiry) => {
                let remaining = expiry - Utc::now();
                if remaining > Duration::seconds(MIN_TICKET_LIFETIME_SECS) {
                    debug!(
                        "Credentials remain valid for another {} seconds.",
                        remaining.num_seconds()
                    );
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Make sure the account is logged in.
    ///
    /// On a fresh login, an empty request and a player fetch follow; the
    /// player fetch seeds the tutorial state and moderation flags.
    ///
    /// # Errors
    ///
    /// - [`Error::TooManyLoginAttempts`] once every allowed attempt was rejected
    /// - [`Error::Sequence`] if a startup request fails
    /// - any non-rejection error from the client's login, unchanged
    pub async fn ensure_authenticated(
        &self,
        account: &mut Account,
        status: &SessionStatus,
    ) -> Result<AuthOutcome> {
        if self.credentials_valid() {
            return Ok(AuthOutcome::AlreadyValid);
        }

        info!("Logging in account {}...", account.username);
        let credentials = account.credentials();
        let proxy = status.proxy_url.as_deref().map(ProxyConfig::uniform);

        let login = retry(self.policy, &self.pacer, Error::is_auth_rejection, |_| {
            self.client.set_authentication(&credentials, proxy.as_ref())
        })
        .await;

        match login {
            Ok(()) => {}
            Err(RetryError::Exhausted { attempts, last }) => {
                error!(
                    "Failed to login with account {} in {} tries ({}). Giving up.",
                    account.username, attempts, last
                );
                return Err(Error::TooManyLoginAttempts {
                    username: account.username.clone(),
                    attempts,
                });
            }
            Err(RetryError::Fatal(err)) => return Err(err),
        }

        self.pacer.pause(pacing::LOGIN_SETTLE).await?;
        self.startup_requests(account).await?;

        Ok(AuthOutcome::LoggedIn)
    }

    async fn startup_requests(&self, account: &mut Account) -> Result<()> {
        self.pacer
            .run(self.client.call(RequestEnvelope::new()))
            .await
            .map_err(|e| {
                error!(
                    "Login for account {} failed. Exception in call request: {}",
                    account.username, e
                );
                Error::sequence("empty request", e)
            })?;
        self.pacer.pause(pacing::AFTER_EMPTY_REQUEST).await?;

        let request = RequestEnvelope::new().with(Operation::get_player());
        let response = self
            .pacer
            .run(self.client.call(request))
            .await
            .map_err(|e| {
                error!(
                    "Login for account {} failed. Exception in get_player: {}",
                    account.username, e
                );
                Error::sequence("get_player", e)
            })?;
        merge::merge_response(account, &response);
        self.pacer.pause(pacing::AFTER_GET_PLAYER).await?;

        Ok(())
    }
}

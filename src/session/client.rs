//! Gameplay API client seam
//!
//! The session core only talks to the remote server through [`ApiClient`].
//! Production deployments plug in a client for the real protocol;
//! [`HttpApiClient`] speaks plain JSON to a mock server, which is what the
//! command line tool and the integration tests use.

use crate::session::network::ProxyConfig;
use crate::types::{Credentials, RequestEnvelope, Response};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use url::Url;

/// Ticket lifetime assumed when the login response does not state one
const DEFAULT_TICKET_MINUTES: i64 = 30;

/// Client for the remote gameplay API
#[async_trait]
pub trait ApiClient: Send + Sync + std::fmt::Debug {
    /// Send every operation in `request` as one round-trip
    async fn call(&self, request: RequestEnvelope) -> Result<Response>;

    /// Log in; rejected credentials must surface as [`Error::Auth`]
    async fn set_authentication(
        &self,
        credentials: &Credentials,
        proxy: Option<&ProxyConfig>,
    ) -> Result<()>;

    /// Route subsequent traffic through `proxy`
    fn set_proxy(&self, proxy: ProxyConfig) -> Result<()>;

    /// When the current auth ticket expires, if logged in
    fn ticket_expiry(&self) -> Option<DateTime<Utc>>;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    provider: &'a str,
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    expires_at_ms: Option<i64>,
}

/// JSON-over-HTTP client for a mock gameplay server
///
/// `POST {base}/login` authenticates, `POST {base}/rpc` carries request
/// envelopes. Both exchange JSON bodies.
#[derive(Debug)]
pub struct HttpApiClient {
    /// Base URL of the mock server, always ending in `/`
    base_url: Url,
    /// Per-request timeout
    timeout: std::time::Duration,
    /// HTTP client, rebuilt whenever the proxy changes
    client: RwLock<Client>,
    /// Expiry of the current ticket
    ticket_expiry: RwLock<Option<DateTime<Utc>>>,
}

impl HttpApiClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            timeout,
            client: RwLock::new(build_client(timeout, None)?),
            ticket_expiry: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn http(&self) -> Client {
        match self.client.read() {
            Ok(client) => client.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

fn build_client(timeout: std::time::Duration, proxy: Option<&ProxyConfig>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent("Niantic App")
        .timeout(timeout);

    if let Some(proxy) = proxy {
        builder = builder
            .proxy(reqwest::Proxy::http(&proxy.http)?)
            .proxy(reqwest::Proxy::https(&proxy.https)?);
    }

    Ok(builder.build()?)
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn call(&self, request: RequestEnvelope) -> Result<Response> {
        let url = self.endpoint("rpc")?;
        tracing::trace!("Sending {:?} to {}", request.names(), url);

        let response = self.http().post(url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(format!("RPC returned HTTP {}", status)));
        }

        Ok(response.json::<Response>().await?)
    }

    async fn set_authentication(
        &self,
        credentials: &Credentials,
        proxy: Option<&ProxyConfig>,
    ) -> Result<()> {
        if let Some(proxy) = proxy {
            self.set_proxy(proxy.clone())?;
        }

        let body = LoginRequest {
            provider: credentials.provider.as_str(),
            username: &credentials.username,
            password: &credentials.password,
        };

        let response = self
            .http()
            .post(self.endpoint("login")?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::auth(format!(
                "{} login for {} rejected with HTTP {}",
                credentials.provider.as_str(),
                credentials.username,
                status
            )));
        }
        if !status.is_success() {
            return Err(Error::transport(format!("Login returned HTTP {}", status)));
        }

        let text = response.text().await?;
        let login: LoginResponse = if text.trim().is_empty() {
            LoginResponse::default()
        } else {
            serde_json::from_str(&text)?
        };
        let expiry = login
            .expires_at_ms
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_else(|| Utc::now() + Duration::minutes(DEFAULT_TICKET_MINUTES));

        match self.ticket_expiry.write() {
            Ok(mut ticket) => *ticket = Some(expiry),
            Err(poisoned) => *poisoned.into_inner() = Some(expiry),
        }

        Ok(())
    }

    fn set_proxy(&self, proxy: ProxyConfig) -> Result<()> {
        let client = build_client(self.timeout, Some(&proxy))?;
        match self.client.write() {
            Ok(mut current) => *current = client,
            Err(poisoned) => *poisoned.into_inner() = client,
        }
        Ok(())
    }

    fn ticket_expiry(&self) -> Option<DateTime<Utc>> {
        match self.ticket_expiry.read() {
            Ok(ticket) => *ticket,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

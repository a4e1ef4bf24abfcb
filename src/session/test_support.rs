//! Scripted API client for session tests

use crate::session::client::ApiClient;
use crate::session::network::{ProxyAssignment, ProxyConfig, ProxyProvider};
use crate::session::pacing::{Pacer, PacingPolicy};
use crate::types::{Credentials, RequestEnvelope, Response};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_util::sync::CancellationToken;

/// Client that replays queued responses and records every request.
///
/// Once the queue is empty every call gets an empty response.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<Response>>>,
    requests: Mutex<Vec<RequestEnvelope>>,
    proxies: Mutex<Vec<ProxyConfig>>,
    expiry: Mutex<Option<DateTime<Utc>>>,
    rejections_left: AtomicU32,
    auth_attempts: AtomicU32,
    cancel_on_call: Mutex<Option<CancellationToken>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response decoded from JSON
    pub fn respond(self, json: serde_json::Value) -> Self {
        let response = serde_json::from_value(json).expect("scripted response must decode");
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue an empty response
    pub fn respond_empty(self) -> Self {
        self.responses.lock().unwrap().push_back(Ok(Response::default()));
        self
    }

    /// Queue a failed call
    pub fn fail(self, error: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Reject the next `count` logins
    pub fn reject_logins(self, count: u32) -> Self {
        self.rejections_left.store(count, Ordering::SeqCst);
        self
    }

    /// Cancel `token` as soon as a call is answered
    pub fn cancel_on_call(self, token: CancellationToken) -> Self {
        *self.cancel_on_call.lock().unwrap() = Some(token);
        self
    }

    /// Pretend a login already happened, with a ticket valid until `expiry`
    pub fn with_ticket(self, expiry: DateTime<Utc>) -> Self {
        *self.expiry.lock().unwrap() = Some(expiry);
        self
    }

    pub fn requests(&self) -> Vec<RequestEnvelope> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn auth_attempts(&self) -> u32 {
        self.auth_attempts.load(Ordering::SeqCst)
    }

    pub fn proxies(&self) -> Vec<ProxyConfig> {
        self.proxies.lock().unwrap().clone()
    }

    /// Requests that carried an operation named `name`
    pub fn requests_with(&self, name: &str) -> Vec<RequestEnvelope> {
        self.requests()
            .into_iter()
            .filter(|request| request.contains(name))
            .collect()
    }
}

#[async_trait]
impl ApiClient for ScriptedClient {
    async fn call(&self, request: RequestEnvelope) -> Result<Response> {
        self.requests.lock().unwrap().push(request);
        if let Some(token) = self.cancel_on_call.lock().unwrap().as_ref() {
            token.cancel();
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Response::default()))
    }

    async fn set_authentication(
        &self,
        credentials: &Credentials,
        proxy: Option<&ProxyConfig>,
    ) -> Result<()> {
        self.auth_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(proxy) = proxy {
            self.proxies.lock().unwrap().push(proxy.clone());
        }

        let left = self.rejections_left.load(Ordering::SeqCst);
        if left > 0 {
            self.rejections_left.store(left - 1, Ordering::SeqCst);
            return Err(Error::auth(format!("{} rejected", credentials.username)));
        }

        *self.expiry.lock().unwrap() = Some(Utc::now() + Duration::minutes(30));
        Ok(())
    }

    fn set_proxy(&self, proxy: ProxyConfig) -> Result<()> {
        self.proxies.lock().unwrap().push(proxy);
        Ok(())
    }

    fn ticket_expiry(&self) -> Option<DateTime<Utc>> {
        *self.expiry.lock().unwrap()
    }
}

/// Provider that hands out numbered proxies and counts requests
#[derive(Debug, Default)]
pub struct CountingProxyProvider {
    handed_out: AtomicU32,
}

impl CountingProxyProvider {
    pub fn handed_out(&self) -> u32 {
        self.handed_out.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxyProvider for CountingProxyProvider {
    async fn get_proxy(&self) -> Result<ProxyAssignment> {
        let n = self.handed_out.fetch_add(1, Ordering::SeqCst);
        Ok(ProxyAssignment {
            identifier: n.to_string(),
            url: format!("http://proxy-{}:8080", n),
        })
    }
}

/// Pacer that never sleeps
pub fn instant_pacer() -> Pacer {
    Pacer::new(PacingPolicy::disabled(), CancellationToken::new())
}

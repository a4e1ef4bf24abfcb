//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

/// Test helper functions
pub mod helpers {
    use pogom_session::{
        Settings,
        session::{HttpApiClient, HttpSessionOrchestrator},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Settings that never pause and retry logins immediately
    pub fn create_test_settings(mock_url: &str) -> Settings {
        let mut settings = Settings::default();
        settings.api.mock_url = Some(mock_url.to_string());
        settings.api.timeout_secs = 5;
        settings.pacing.scale = 0.0;
        settings.login.delay_secs = 0.0;
        settings
    }

    /// Orchestrator talking to `server`
    pub fn create_test_orchestrator(server: &MockServer, settings: Settings) -> HttpSessionOrchestrator {
        let client = HttpApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        HttpSessionOrchestrator::new(settings, Arc::new(client), None).unwrap()
    }

    /// Accept every login
    pub async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "expires_at_ms": 4_102_444_800_000i64
            })))
            .mount(server)
            .await;
    }

    /// Mock answering envelopes whose first operation is `operation`
    pub fn rpc(operation: &str, body: Value) -> Mock {
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({"operations": [{"type": operation}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
    }

    /// Answer anything not matched by a more specific mock with an empty response
    pub async fn mount_fallback(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": {}})))
            .with_priority(10)
            .mount(server)
            .await;
    }

    /// Operation types of every envelope the server received, in order
    pub async fn received_operations(server: &MockServer) -> Vec<Vec<String>> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == "/rpc")
            .map(|request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                body["operations"]
                    .as_array()
                    .map(|operations| {
                        operations
                            .iter()
                            .map(|op| op["type"].as_str().unwrap_or_default().to_string())
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect()
    }
}

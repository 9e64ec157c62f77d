//! Authenticated rate-limit probe against the GraphQL endpoint
//!
//! One POST per token, bearer credential in the Authorization header, the
//! response returned uninterpreted as a `ProbeOutcome`. The token value is
//! only exposed when the header is built and the header is marked sensitive.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use common::Secret;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue, USER_AGENT};
use tracing::{debug, instrument};

use crate::constants::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, GRAPHQL_ENDPOINT, RATE_LIMIT_QUERY};
use crate::types::{GraphQlResponse, ProbeOutcome};

/// Longest slice of a non-JSON error body carried into a failure message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Source of probe outcomes for one token at a time.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Fetcher>` in the service state).
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        token: &'a Secret<String>,
    ) -> Pin<Box<dyn Future<Output = ProbeOutcome> + Send + 'a>>;
}

/// Fetcher backed by `reqwest` and the real GraphQL endpoint.
#[derive(Clone)]
pub struct GraphQlFetcher {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    user_agent: String,
}

impl GraphQlFetcher {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn probe(&self, token: &Secret<String>) -> ProbeOutcome {
        let mut authorization = match HeaderValue::from_str(&format!("bearer {}", token.expose())) {
            Ok(v) => v,
            Err(_) => {
                return ProbeOutcome::failure("token is not a valid HTTP header value", None);
            }
        };
        authorization.set_sensitive(true);

        let body = serde_json::json!({
            "query": RATE_LIMIT_QUERY,
            "variables": {},
        })
        .to_string();

        let response = match self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return ProbeOutcome::failure(
                    format!("upstream timeout after {}ms", self.timeout.as_millis()),
                    None,
                );
            }
            Err(e) => {
                return ProbeOutcome::failure(format!("upstream request failed: {e}"), None);
            }
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                return ProbeOutcome::failure(
                    format!("upstream response read error: {e}"),
                    Some(status.as_u16()),
                );
            }
        };
        debug!(status = status.as_u16(), bytes = bytes.len(), "probe response received");

        if !status.is_success() {
            let message = failure_message(&bytes)
                .or_else(|| status.canonical_reason().map(str::to_owned))
                .unwrap_or_else(|| format!("upstream returned {status}"));
            return ProbeOutcome::failure(message, Some(status.as_u16()));
        }

        ProbeOutcome::Payload(GraphQlResponse::from_slice(&bytes))
    }
}

impl Default for GraphQlFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), GRAPHQL_ENDPOINT, DEFAULT_TIMEOUT)
    }
}

impl Fetcher for GraphQlFetcher {
    fn fetch<'a>(
        &'a self,
        token: &'a Secret<String>,
    ) -> Pin<Box<dyn Future<Output = ProbeOutcome> + Send + 'a>> {
        Box::pin(self.probe(token))
    }
}

/// Message of a non-2xx body: the JSON `message` field GitHub sends with
/// REST-style errors, else the trimmed text itself.
fn failure_message(body: &[u8]) -> Option<String> {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(body)
        && let Some(message) = json.get("message").and_then(|m| m.as_str())
    {
        return Some(message.to_string());
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(MAX_ERROR_BODY_CHARS).collect())
}

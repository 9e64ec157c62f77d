//! GraphQL wire types and the raw probe outcome

use serde::{Deserialize, Serialize};

use crate::constants::MALFORMED_RESPONSE;

/// Raw result of contacting the upstream for one token.
///
/// `Payload` is any 2xx response; the body may still carry GraphQL-level
/// errors. `Failure` is everything the transport rejected: non-2xx status,
/// connection errors, timeouts.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Payload(GraphQlResponse),
    Failure(TransportFailure),
}

impl ProbeOutcome {
    pub fn failure(message: impl Into<String>, status: Option<u16>) -> Self {
        ProbeOutcome::Failure(TransportFailure {
            message: message.into(),
            status,
        })
    }
}

/// A failure thrown by the transport, with the upstream's message when one
/// was available and the HTTP status when a response arrived at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub message: String,
    pub status: Option<u16>,
}

/// Body of a GraphQL response: `data`, `errors`, or both.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<RateLimitData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQlError>>,
}

impl GraphQlResponse {
    /// Parse a 2xx body. Anything that is not GraphQL JSON becomes a response
    /// with a single `MALFORMED_RESPONSE` error rather than a parse failure.
    pub fn from_slice(body: &[u8]) -> Self {
        match serde_json::from_slice(body) {
            Ok(response) => response,
            Err(e) => Self::malformed(format!("response body is not valid GraphQL JSON: {e}")),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: Some(vec![GraphQlError {
                kind: Some(MALFORMED_RESPONSE.to_string()),
                message: message.into(),
            }]),
        }
    }

    /// First GraphQL error, treating an empty `errors` array as no errors.
    pub fn first_error(&self) -> Option<&GraphQlError> {
        self.errors.as_deref().and_then(|errors| errors.first())
    }

    pub fn rate_limit(&self) -> Option<&RateLimit> {
        self.data.as_ref()?.rate_limit.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RateLimitData {
    #[serde(rename = "rateLimit", default)]
    pub rate_limit: Option<RateLimit>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RateLimit {
    pub remaining: u64,
    /// RFC 3339 timestamp, kept as text so a bad value does not poison the
    /// whole body
    #[serde(rename = "resetAt", default, skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<String>,
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GraphQlError {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: String,
}

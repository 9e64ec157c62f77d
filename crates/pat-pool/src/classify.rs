//! Probe outcome classification
//!
//! Maps one raw `ProbeOutcome` to a token status. The upstream exposes no
//! structured codes for expired or suspended tokens, so those two are told
//! apart by literal, case-insensitive comparison with the upstream message.
//! Anything that does not match is returned as `Unclassified` rather than
//! folded into an existing bucket.

use chrono::{DateTime, Utc};
use graphql_probe::{GraphQlResponse, ProbeOutcome, RATE_LIMITED, TransportFailure};

use crate::report::TokenDetail;

/// Upstream message for a revoked or expired token.
pub const BAD_CREDENTIALS: &str = "bad credentials";

/// Upstream message for a token whose account was suspended.
pub const ACCOUNT_SUSPENDED: &str = "sorry. your account was suspended.";

/// Result of classifying one probe.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Classified(TokenDetail),
    /// The failure says nothing about the token; the pool check must abort.
    Unclassified(TransportFailure),
}

/// Classify a probe outcome. `now` is the reference for `resetIn`.
///
/// Priority: non-rate-limit GraphQL error → `error`; rate-limit error or zero
/// quota → `exhausted`; quota left → `valid`; "bad credentials" failure →
/// `expired`; "account suspended" failure → `suspended`; anything else →
/// `Unclassified`.
pub fn classify(outcome: &ProbeOutcome, now: DateTime<Utc>) -> Classification {
    match outcome {
        ProbeOutcome::Payload(response) => classify_payload(response, now),
        ProbeOutcome::Failure(failure) => classify_failure(failure),
    }
}

fn classify_payload(response: &GraphQlResponse, now: DateTime<Utc>) -> Classification {
    let first_error = response.first_error();
    let rate_limited_error =
        first_error.is_some_and(|e| e.kind.as_deref() == Some(RATE_LIMITED));

    if let Some(error) = first_error
        && !rate_limited_error
    {
        return Classification::Classified(TokenDetail::Error {
            error: error.clone(),
        });
    }

    let rate_limit = response.rate_limit();
    if rate_limited_error || rate_limit.is_some_and(|r| r.remaining == 0) {
        let reset_in = rate_limit
            .and_then(|r| r.reset_at.as_deref())
            .and_then(|reset_at| minutes_until(reset_at, now));
        return Classification::Classified(TokenDetail::Exhausted {
            remaining: 0,
            reset_in,
        });
    }

    match rate_limit {
        Some(r) => Classification::Classified(TokenDetail::Valid {
            remaining: r.remaining,
        }),
        None => Classification::Unclassified(TransportFailure {
            message: "response carried neither errors nor a rateLimit payload".into(),
            status: None,
        }),
    }
}

fn classify_failure(failure: &TransportFailure) -> Classification {
    if failure.message.eq_ignore_ascii_case(BAD_CREDENTIALS) {
        Classification::Classified(TokenDetail::Expired)
    } else if failure.message.eq_ignore_ascii_case(ACCOUNT_SUSPENDED) {
        Classification::Classified(TokenDetail::Suspended)
    } else {
        Classification::Unclassified(failure.clone())
    }
}

/// Signed whole minutes from `now` until an RFC 3339 `reset_at`, rounded to
/// the nearest minute. Not clamped: a reset in the past gives a negative value.
pub fn minutes_until(reset_at: &str, now: DateTime<Utc>) -> Option<i64> {
    let reset = DateTime::parse_from_rfc3339(reset_at).ok()?;
    let millis = reset.with_timezone(&Utc).signed_duration_since(now).num_milliseconds();
    Some((millis as f64 / 60_000.0).round() as i64)
}

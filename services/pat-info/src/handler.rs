//! PAT pool report endpoint
//!
//! Runs a full pool check per request and answers with the JSON report. A
//! successful report is shared-cacheable for `cache_seconds` so that repeat
//! hits are served by the CDN instead of spending quota on fresh probes.
//! Failures are never cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::Secret;
use graphql_probe::Fetcher;
use pat_pool::{PoolReport, check_pool};
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::metrics;

/// Route of the report endpoint
pub const PAT_INFO_PATH: &str = "/api/status/pat-info";

/// Prefix of every failure body
pub const FAILURE_PREFIX: &str = "Something went wrong: ";

/// Shared state for the report handler
#[derive(Clone)]
pub struct ReportState {
    pub fetcher: Arc<dyn Fetcher>,
    /// Configuration store the pool is located in (`PAT_*` keys)
    pub env: Arc<HashMap<String, Secret<String>>>,
    pub cache_seconds: u64,
    pub checks_total: Arc<AtomicU64>,
}

/// Check the pool and render the response.
#[instrument(skip_all, fields(request_id = %request_id))]
pub async fn pat_info(state: &ReportState, request_id: String) -> Response {
    state.checks_total.fetch_add(1, Ordering::Relaxed);
    let started = Instant::now();

    match build_report(state).await {
        Ok((report, body)) => {
            metrics::record_check(true, started.elapsed().as_secs_f64());
            metrics::record_report(&report);
            info!(pats = report.len(), "PAT report served");
            success_response(body, state.cache_seconds)
        }
        Err(e) => {
            metrics::record_check(false, started.elapsed().as_secs_f64());
            error!(error = %e, "PAT pool check failed");
            failure_response(&e.to_string())
        }
    }
}

async fn build_report(state: &ReportState) -> Result<(PoolReport, String)> {
    let report = check_pool(state.fetcher.as_ref(), &state.env).await?;
    let body = serde_json::to_string_pretty(&report)?;
    Ok((report, body))
}

/// `max-age=0` keeps browsers revalidating while shared caches hold the
/// report for `cache_seconds`.
fn success_response(body: String, cache_seconds: u64) -> Response {
    let cache_control = format!("max-age=0, s-maxage={cache_seconds}");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, cache_control.as_str()),
        ],
        body,
    )
        .into_response()
}

/// The body is plain text but the content type stays `application/json`,
/// the same as on success; clients key on the body prefix and `no-store`.
fn failure_response(message: &str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        format!("{FAILURE_PREFIX}{message}"),
    )
        .into_response()
}

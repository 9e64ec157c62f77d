//! Service-specific error types

use thiserror::Error;

/// Failures of one report request. They end the request with the
/// non-caching plain-text fallback; they never take the process down.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Check(#[from] pat_pool::Error),

    /// Defensive: a `PoolReport` holds only strings and integers, so
    /// rendering it does not fail in practice.
    #[error("failed to serialize PAT report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result alias using service Error
pub type Result<T> = std::result::Result<T, Error>;

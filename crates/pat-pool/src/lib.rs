//! Health check for a pool of GitHub personal access tokens
//!
//! Locates every `PAT_*` key in a configuration store, probes each token
//! against the GraphQL rate-limit endpoint one at a time, classifies the
//! outcome and folds the results into a `PoolReport`.
//!
//! Token lifecycle as seen by the classifier:
//! 1. Quota left → `valid` (with remaining count)
//! 2. Quota spent or `RATE_LIMITED` error → `exhausted` (with minutes to reset)
//! 3. Upstream says "Bad credentials" → `expired`
//! 4. Upstream says the account was suspended → `suspended`
//! 5. Any other GraphQL error → `error` (with type and message)
//!
//! Any other transport failure is not a property of the token. It aborts the
//! whole check instead of being folded into the report.

pub mod check;
pub mod classify;
pub mod error;
pub mod locator;
pub mod report;

pub use check::check_pool;
pub use classify::{Classification, classify};
pub use error::{Error, Result};
pub use locator::{is_pat_key, locate_pats};
pub use report::{PoolReport, TokenDetail, TokenStatus};

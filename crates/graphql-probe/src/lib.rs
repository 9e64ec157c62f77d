//! Upstream prober for GitHub personal access tokens
//!
//! Issues one minimal GraphQL query per token (`rateLimit { remaining, resetAt }`)
//! and hands back the raw transport outcome. Nothing in this crate decides
//! whether a token is healthy; that is the classifier's job in `pat-pool`.
//!
//! The `Fetcher` trait is the seam between the pool checker and the network:
//! `GraphQlFetcher` talks to the real endpoint, tests substitute scripted fakes.

pub mod constants;
pub mod fetcher;
pub mod types;

pub use constants::*;
pub use fetcher::{Fetcher, GraphQlFetcher};
pub use types::{GraphQlError, GraphQlResponse, ProbeOutcome, RateLimit, RateLimitData, TransportFailure};

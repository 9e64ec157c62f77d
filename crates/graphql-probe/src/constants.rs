//! GitHub GraphQL endpoint and wire constants

use std::time::Duration;

/// Public GitHub GraphQL endpoint
pub const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

/// Query sent for every probe. Asks only for the caller's own quota so the
/// probe itself costs as little of that quota as possible.
pub const RATE_LIMIT_QUERY: &str = "query { rateLimit { remaining resetAt } }";

/// GraphQL error `type` GitHub reports when a token has no quota left
pub const RATE_LIMITED: &str = "RATE_LIMITED";

/// Synthetic GraphQL error `type` for 2xx bodies that are not GraphQL JSON
pub const MALFORMED_RESPONSE: &str = "MALFORMED_RESPONSE";

/// GitHub rejects API requests without a User-Agent
pub const DEFAULT_USER_AGENT: &str = "pat-info";

/// Per-probe timeout when the caller does not configure one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

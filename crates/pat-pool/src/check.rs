//! Sequential pool check
//!
//! Probes every located token one after another, never concurrently.
//! The report is all-or-nothing: an abort discards every detail gathered so far.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use common::Secret;
use graphql_probe::Fetcher;
use tracing::{debug, info, warn};

use crate::classify::{Classification, classify};
use crate::error::{Error, Result};
use crate::locator::locate_pats;
use crate::report::PoolReport;

/// Check every `PAT_*` entry in `env` and build the pool report.
///
/// Values stay inside their `Secret` and are handed to the fetcher by
/// reference; no copy of a token is made here.
///
/// Tokens are probed in key order. An empty pool yields an empty report.
/// Returns `Error::Unclassified` on the first probe failure the classifier
/// cannot attribute to the token.
pub async fn check_pool<F>(
    fetcher: &F,
    env: &HashMap<String, Secret<String>>,
) -> Result<PoolReport>
where
    F: Fetcher + ?Sized,
{
    let mut pats = locate_pats(env.keys());
    pats.sort();
    info!(pats = pats.len(), "checking PAT pool");

    let mut details = BTreeMap::new();
    for pat in pats {
        let Some(token) = env.get(&pat) else {
            continue;
        };
        let outcome = fetcher.fetch(token).await;

        match classify(&outcome, Utc::now()) {
            Classification::Classified(detail) => {
                debug!(pat = %pat, status = detail.status().label(), "PAT classified");
                details.insert(pat, detail);
            }
            Classification::Unclassified(failure) => {
                warn!(
                    pat = %pat,
                    status = ?failure.status,
                    error = %failure.message,
                    "unclassified probe failure, aborting pool check"
                );
                return Err(Error::Unclassified {
                    pat,
                    message: failure.message,
                    status: failure.status,
                });
            }
        }
    }

    let report = PoolReport::from_details(details);
    info!(
        valid = report.valid.len(),
        expired = report.expired.len(),
        exhausted = report.exhausted.len(),
        suspended = report.suspended.len(),
        error = report.error.len(),
        "PAT pool checked"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{TokenDetail, TokenStatus};
    use graphql_probe::{GraphQlError, GraphQlResponse, ProbeOutcome, RateLimit, RateLimitData};
    use std::collections::BTreeSet;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    /// Fetcher that answers from a script keyed by token value and records
    /// the order of the calls it received.
    struct ScriptedFetcher {
        outcomes: HashMap<String, ProbeOutcome>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<(&str, ProbeOutcome)>) -> Self {
            Self {
                outcomes: script
                    .into_iter()
                    .map(|(token, outcome)| (token.to_string(), outcome))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Fetcher for ScriptedFetcher {
        fn fetch<'a>(
            &'a self,
            token: &'a Secret<String>,
        ) -> Pin<Box<dyn Future<Output = ProbeOutcome> + Send + 'a>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(token.expose().clone());
                self.outcomes
                    .get(token.expose())
                    .cloned()
                    .unwrap_or_else(|| ProbeOutcome::failure("unscripted token", None))
            })
        }
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, Secret<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Secret::from(*v)))
            .collect()
    }

    fn valid(remaining: u64) -> ProbeOutcome {
        ProbeOutcome::Payload(GraphQlResponse {
            data: Some(RateLimitData {
                rate_limit: Some(RateLimit {
                    remaining,
                    reset_at: None,
                }),
            }),
            errors: None,
        })
    }

    fn exhausted_in(minutes: i64) -> ProbeOutcome {
        ProbeOutcome::Payload(GraphQlResponse {
            data: Some(RateLimitData {
                rate_limit: Some(RateLimit {
                    remaining: 0,
                    reset_at: Some((Utc::now() + chrono::Duration::minutes(minutes)).to_rfc3339()),
                }),
            }),
            errors: None,
        })
    }

    fn graphql_error(kind: &str, message: &str) -> ProbeOutcome {
        ProbeOutcome::Payload(GraphQlResponse {
            data: None,
            errors: Some(vec![GraphQlError {
                kind: Some(kind.into()),
                message: message.into(),
            }]),
        })
    }

    #[tokio::test]
    async fn empty_pool_yields_empty_report() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let report = check_pool(&fetcher, &env(&[("PATH", "/usr/bin")]))
            .await
            .unwrap();

        assert_eq!(report, PoolReport::default());
        assert!(fetcher.calls().is_empty(), "no probe without tokens");
    }

    #[tokio::test]
    async fn every_status_lands_in_its_bucket() {
        let fetcher = ScriptedFetcher::new(vec![
            ("tok_valid", valid(42)),
            ("tok_exhausted", exhausted_in(10)),
            ("tok_expired", ProbeOutcome::failure("Bad credentials", Some(401))),
            (
                "tok_suspended",
                ProbeOutcome::failure("Sorry. Your account was suspended.", Some(403)),
            ),
            ("tok_error", graphql_error("INTERNAL", "Something went wrong")),
        ]);
        let env = env(&[
            ("PAT_1", "tok_valid"),
            ("PAT_2", "tok_exhausted"),
            ("PAT_3", "tok_expired"),
            ("PAT_4", "tok_suspended"),
            ("PAT_5", "tok_error"),
            ("PATTERN", "tok_never_probed"),
        ]);

        let report = check_pool(&fetcher, &env).await.unwrap();

        assert_eq!(report.valid, BTreeSet::from(["PAT_1".to_string()]));
        assert_eq!(report.exhausted, BTreeSet::from(["PAT_2".to_string()]));
        assert_eq!(report.expired, BTreeSet::from(["PAT_3".to_string()]));
        assert_eq!(report.suspended, BTreeSet::from(["PAT_4".to_string()]));
        assert_eq!(report.error, BTreeSet::from(["PAT_5".to_string()]));

        assert_eq!(report.details["PAT_1"], TokenDetail::Valid { remaining: 42 });
        match &report.details["PAT_2"] {
            TokenDetail::Exhausted {
                remaining,
                reset_in,
            } => {
                assert_eq!(*remaining, 0);
                // The clock moves between building the script and classifying.
                assert!(matches!(reset_in, Some(9..=10)), "got: {reset_in:?}");
            }
            other => panic!("expected exhausted, got {other:?}"),
        }
        assert!(!fetcher.calls().contains(&"tok_never_probed".to_string()));
    }

    #[tokio::test]
    async fn buckets_partition_the_pool() {
        let fetcher = ScriptedFetcher::new(vec![
            ("a", valid(1)),
            ("b", valid(2)),
            ("c", ProbeOutcome::failure("bad credentials", Some(401))),
            ("d", graphql_error(graphql_probe::RATE_LIMITED, "limit")),
        ]);
        let env = env(&[("PAT_1", "a"), ("PAT_2", "b"), ("PAT_3", "c"), ("PAT_", "d")]);

        let report = check_pool(&fetcher, &env).await.unwrap();

        let pool: BTreeSet<String> = ["PAT_", "PAT_1", "PAT_2", "PAT_3"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut union = BTreeSet::new();
        for status in TokenStatus::ALL {
            for pat in report.bucket(status) {
                assert!(union.insert(pat.clone()), "{pat} in more than one bucket");
            }
        }
        assert_eq!(union, pool);
        assert_eq!(report.details.keys().cloned().collect::<BTreeSet<_>>(), pool);
    }

    #[tokio::test]
    async fn tokens_are_probed_sequentially_in_key_order() {
        let fetcher = ScriptedFetcher::new(vec![
            ("t1", valid(1)),
            ("t10", valid(10)),
            ("t2", valid(2)),
        ]);
        let env = env(&[("PAT_2", "t2"), ("PAT_10", "t10"), ("PAT_1", "t1")]);

        let report = check_pool(&fetcher, &env).await.unwrap();

        assert_eq!(fetcher.calls(), vec!["t1", "t10", "t2"]);
        assert_eq!(
            report.details.keys().collect::<Vec<_>>(),
            vec!["PAT_1", "PAT_10", "PAT_2"]
        );
    }

    #[tokio::test]
    async fn unclassified_failure_aborts_and_names_the_pat() {
        let fetcher = ScriptedFetcher::new(vec![
            ("t1", valid(1)),
            ("ghp_secret_two", ProbeOutcome::failure("connection reset by peer", None)),
            ("t3", valid(3)),
        ]);
        let env = env(&[("PAT_1", "t1"), ("PAT_2", "ghp_secret_two"), ("PAT_3", "t3")]);

        let err = check_pool(&fetcher, &env).await.unwrap_err();

        match &err {
            Error::Unclassified {
                pat,
                message,
                status,
            } => {
                assert_eq!(pat, "PAT_2");
                assert_eq!(message, "connection reset by peer");
                assert!(status.is_none());
            }
        }
        assert_eq!(
            fetcher.calls(),
            vec!["t1", "ghp_secret_two"],
            "no probe after the abort"
        );
        assert!(err.to_string().contains("connection reset by peer"));
        assert!(
            !err.to_string().contains("ghp_secret_two"),
            "token value must not leak"
        );
    }

    #[tokio::test]
    async fn works_through_a_trait_object() {
        let fetcher: Box<dyn Fetcher> = Box::new(ScriptedFetcher::new(vec![("t", valid(9))]));
        let report = check_pool(fetcher.as_ref(), &env(&[("PAT_1", "t")]))
            .await
            .unwrap();
        assert_eq!(report.details["PAT_1"], TokenDetail::Valid { remaining: 9 });
    }
}

//! Prometheus metrics exposition
//!
//! - `pat_checks_total` (counter): label `outcome` (`success` | `failure`)
//! - `pat_check_duration_seconds` (histogram)
//! - `pat_tokens` (gauge): label `status`, sizes of the last successful report

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use pat_pool::PoolReport;

/// A check against a large pool can run for tens of seconds.
const CHECK_DURATION_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

fn builder() -> PrometheusBuilder {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("pat_check_duration_seconds".to_string()),
            CHECK_DURATION_BUCKETS,
        )
        .expect("failed to set histogram buckets")
}

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> PrometheusHandle {
    builder()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Record one finished pool check.
pub fn record_check(success: bool, duration_secs: f64) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("pat_checks_total", "outcome" => outcome).increment(1);
    metrics::histogram!("pat_check_duration_seconds").record(duration_secs);
}

/// Publish bucket sizes of a successful report.
pub fn record_report(report: &PoolReport) {
    for (status, count) in report.counts() {
        metrics::gauge!("pat_tokens", "status" => status.label()).set(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusRecorder;
    use pat_pool::TokenDetail;
    use std::collections::BTreeMap;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_check(true, 0.2);
        record_report(&PoolReport::default());
    }

    /// Isolated recorder/handle pair; `install_recorder()` may only run once
    /// per process.
    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = builder().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn record_check_counts_outcomes_and_renders_histogram() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_check(true, 0.4);
        record_check(false, 12.0);

        let output = handle.render();
        assert!(output.contains("pat_checks_total"));
        assert!(output.contains("outcome=\"success\""));
        assert!(output.contains("outcome=\"failure\""));
        assert!(
            output.contains("pat_check_duration_seconds_bucket"),
            "histogram must render _bucket lines"
        );
        assert!(output.contains("le=\"60\""), "60s bucket must exist");
    }

    #[test]
    fn record_report_sets_one_gauge_per_status() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let report = PoolReport::from_details(BTreeMap::from([
            ("PAT_1".to_string(), TokenDetail::Valid { remaining: 10 }),
            ("PAT_2".to_string(), TokenDetail::Valid { remaining: 20 }),
            ("PAT_3".to_string(), TokenDetail::Expired),
        ]));
        record_report(&report);

        let output = handle.render();
        assert!(output.contains("pat_tokens{status=\"valid\"} 2"), "got:\n{output}");
        assert!(output.contains("pat_tokens{status=\"expired\"} 1"), "got:\n{output}");
        assert!(output.contains("pat_tokens{status=\"suspended\"} 0"), "got:\n{output}");
    }
}

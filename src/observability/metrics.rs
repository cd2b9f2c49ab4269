//! Metrics collection for `redprobe`.
//!
//! Typed convenience functions over the `metrics` facade with label
//! cardinality protection. The macros silently no-op when no global
//! recorder is installed, so recording is always safe to call.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Known attack kind names used for label cardinality protection.
///
/// Any kind not in this list is bucketed as `"__unknown__"` so
/// caller-controlled strings cannot explode label cardinality.
const KNOWN_KINDS: [&str; 6] = [
    "flood",
    "injection",
    "reflection",
    "credential-guess",
    "port-sweep",
    "other",
];

/// Sanitizes an attack kind name for use as a metrics label.
#[must_use]
pub fn sanitize_kind_label(kind: &str) -> &str {
    if KNOWN_KINDS.contains(&kind) {
        kind
    } else {
        "__unknown__"
    }
}

/// Registers metric descriptions with the global recorder.
pub fn describe_metrics() {
    describe_counter!("redprobe_runs_total", "Total attack runs started");
    describe_counter!(
        "redprobe_runs_completed_total",
        "Attack runs reaching a terminal state, by outcome"
    );
    describe_histogram!(
        "redprobe_run_duration_ms",
        "End-to-end run duration in milliseconds"
    );
    describe_counter!(
        "redprobe_probe_requests_total",
        "Probe requests sent, by attack kind"
    );
    describe_counter!(
        "redprobe_blocks_total",
        "Adjudication decisions, by outcome"
    );
    describe_counter!(
        "redprobe_classifier_fallbacks_total",
        "External classifier failures that fell back to the rule tier"
    );
    describe_gauge!("redprobe_runs_active", "Currently executing runs");
}

/// Records a run start.
pub fn record_run_started(kind: &str) {
    counter!("redprobe_runs_total", "kind" => sanitize_kind_label(kind).to_owned()).increment(1);
}

/// Records a run reaching a terminal state.
pub fn record_run_completed(kind: &str, success: bool, duration: Duration) {
    let status = if success { "completed" } else { "failed" };
    counter!(
        "redprobe_runs_completed_total",
        "kind" => sanitize_kind_label(kind).to_owned(),
        "status" => status,
    )
    .increment(1);
    histogram!("redprobe_run_duration_ms", "kind" => sanitize_kind_label(kind).to_owned())
        .record(duration.as_secs_f64() * 1000.0);
}

/// Records probe requests sent during a run.
pub fn record_probe_requests(kind: &str, count: u64) {
    counter!("redprobe_probe_requests_total", "kind" => sanitize_kind_label(kind).to_owned())
        .increment(count);
}

/// Records an adjudication decision.
pub fn record_decision(blocked: bool) {
    let outcome = if blocked { "blocked" } else { "allowed" };
    counter!("redprobe_blocks_total", "outcome" => outcome).increment(1);
}

/// Records an external classifier failure that fell back to rules.
pub fn record_classifier_fallback() {
    counter!("redprobe_classifier_fallbacks_total").increment(1);
}

/// Sets the number of currently executing runs.
#[allow(clippy::cast_precision_loss)]
pub fn set_runs_active(count: u64) {
    gauge!("redprobe_runs_active").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_known_kind_returns_original() {
        assert_eq!(sanitize_kind_label("flood"), "flood");
        assert_eq!(sanitize_kind_label("port-sweep"), "port-sweep");
    }

    #[test]
    fn sanitize_unknown_kind_returns_unknown() {
        assert_eq!(sanitize_kind_label("zero-day"), "__unknown__");
        assert_eq!(sanitize_kind_label(""), "__unknown__");
    }

    #[test]
    fn very_long_kind_returns_unknown() {
        let long = "x".repeat(10_000);
        assert_eq!(sanitize_kind_label(&long), "__unknown__");
    }

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        // metrics macros silently no-op when no global recorder is installed
        describe_metrics();
        record_run_started("flood");
        record_run_completed("flood", true, Duration::from_millis(1200));
        record_probe_requests("injection", 30);
        record_decision(true);
        record_classifier_fallback();
        set_runs_active(2);
    }
}

/// Prometheus metrics for the complaint lifecycle and moderation engine
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Submission outcomes (labels: outcome=accepted|abusive|banned|classifier_unavailable|failed)
    pub static ref SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "complaint_submissions_total",
        "Total complaint submissions by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Logged abuse attempts (labels: source=submission|description_edit|moderator_flag)
    pub static ref ABUSE_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "complaint_abuse_attempts_total",
        "Total abuse attempts written to the abuse log",
        &["source"]
    )
    .unwrap();

    /// Account bans (labels: reason=abuse_escalation|manual)
    pub static ref ACCOUNT_BANS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "complaint_account_bans_total",
        "Total submitter accounts banned",
        &["reason"]
    )
    .unwrap();

    /// Classifier call failures (labels: policy=fail_open|fail_closed)
    pub static ref CLASSIFIER_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "complaint_classifier_failures_total",
        "Total abuse classifier failures by applied policy",
        &["policy"]
    )
    .unwrap();

    /// Applied status transitions (labels: to=<stored status label>)
    pub static ref STATUS_TRANSITIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "complaint_status_transitions_total",
        "Total complaint status transitions",
        &["to"]
    )
    .unwrap();
}

pub fn record_submission(outcome: &str) {
    SUBMISSIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_abuse_attempt(source: &str) {
    ABUSE_ATTEMPTS_TOTAL.with_label_values(&[source]).inc();
}

pub fn record_ban(reason: &str) {
    ACCOUNT_BANS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn record_classifier_failure(policy: &str) {
    CLASSIFIER_FAILURES_TOTAL.with_label_values(&[policy]).inc();
}

pub fn record_transition(to: &str) {
    STATUS_TRANSITIONS_TOTAL.with_label_values(&[to]).inc();
}

/// Render the default registry in the text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

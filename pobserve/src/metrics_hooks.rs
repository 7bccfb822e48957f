//! Metrics-based observability hooks for transport attempts and scenarios.
//!
//! ```rust
//! use pobserve::MetricsObservabilityHooks;
//! use ptransport::TransportOperationHooks;
//!
//! fn accepts_transport_hooks(_hooks: &dyn TransportOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_transport_hooks(&hooks);
//! ```

use std::time::Duration;

use pcommon::EndpointLabel;
use pharness::{HarnessError, HarnessRuntimeHooks};
use ptransport::{TransportError, TransportOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl TransportOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, endpoint: &EndpointLabel, _attempt: u32) {
        metrics::counter!(
            "prodder_transport_attempt_start_total",
            "endpoint" => endpoint.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        endpoint: &EndpointLabel,
        _attempt: u32,
        delay: Duration,
        error: &TransportError,
    ) {
        metrics::counter!(
            "prodder_transport_retry_scheduled_total",
            "endpoint" => endpoint.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "prodder_transport_retry_delay_seconds",
            "endpoint" => endpoint.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, endpoint: &EndpointLabel, attempts: u32, status: u16) {
        metrics::counter!(
            "prodder_transport_response_total",
            "endpoint" => endpoint.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "prodder_transport_attempts_per_response",
            "endpoint" => endpoint.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(&self, endpoint: &EndpointLabel, attempts: u32, error: &TransportError) {
        metrics::counter!(
            "prodder_transport_failure_total",
            "endpoint" => endpoint.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "prodder_transport_attempts_per_failure",
            "endpoint" => endpoint.to_string()
        )
        .record(attempts as f64);
    }
}

impl HarnessRuntimeHooks for MetricsObservabilityHooks {
    fn on_scenario_start(&self, scenario: &str) {
        metrics::counter!(
            "prodder_scenario_start_total",
            "scenario" => scenario.to_string()
        )
        .increment(1);
    }

    fn on_scenario_success(&self, scenario: &str, elapsed: Duration) {
        metrics::counter!(
            "prodder_scenario_success_total",
            "scenario" => scenario.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "prodder_scenario_duration_seconds",
            "scenario" => scenario.to_string(),
            "outcome" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_scenario_skipped(&self, scenario: &str, _reason: &str, elapsed: Duration) {
        metrics::counter!(
            "prodder_scenario_skipped_total",
            "scenario" => scenario.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "prodder_scenario_duration_seconds",
            "scenario" => scenario.to_string(),
            "outcome" => "skipped"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_scenario_failure(&self, scenario: &str, error: &HarnessError, elapsed: Duration) {
        metrics::counter!(
            "prodder_scenario_failure_total",
            "scenario" => scenario.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "prodder_scenario_duration_seconds",
            "scenario" => scenario.to_string(),
            "outcome" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_run_aborted(&self, scenario: &str, _error: &HarnessError) {
        metrics::counter!(
            "prodder_scenario_run_aborted_total",
            "scenario" => scenario.to_string()
        )
        .increment(1);
    }
}

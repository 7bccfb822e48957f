//! Tracing-based observability hooks for transport attempts and scenarios.
//!
//! ```rust
//! use pobserve::TracingObservabilityHooks;
//! use pharness::HarnessRuntimeHooks;
//!
//! fn accepts_harness_hooks(_hooks: &dyn HarnessRuntimeHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_harness_hooks(&hooks);
//! ```

use std::time::Duration;

use pcommon::EndpointLabel;
use pharness::{HarnessError, HarnessRuntimeHooks};
use ptransport::{TransportError, TransportOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl TransportOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, endpoint: &EndpointLabel, attempt: u32) {
        tracing::debug!(
            phase = "transport",
            event = "attempt_start",
            endpoint = %endpoint,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        endpoint: &EndpointLabel,
        attempt: u32,
        delay: Duration,
        error: &TransportError,
    ) {
        tracing::warn!(
            phase = "transport",
            event = "retry_scheduled",
            endpoint = %endpoint,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_success(&self, endpoint: &EndpointLabel, attempts: u32, status: u16) {
        tracing::debug!(
            phase = "transport",
            event = "success",
            endpoint = %endpoint,
            attempts,
            status
        );
    }

    fn on_failure(&self, endpoint: &EndpointLabel, attempts: u32, error: &TransportError) {
        tracing::error!(
            phase = "transport",
            event = "failure",
            endpoint = %endpoint,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl HarnessRuntimeHooks for TracingObservabilityHooks {
    fn on_scenario_start(&self, scenario: &str) {
        tracing::info!(phase = "harness", event = "scenario_start", scenario);
    }

    fn on_scenario_success(&self, scenario: &str, elapsed: Duration) {
        tracing::info!(
            phase = "harness",
            event = "scenario_success",
            scenario,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_scenario_skipped(&self, scenario: &str, reason: &str, elapsed: Duration) {
        tracing::warn!(
            phase = "harness",
            event = "scenario_skipped",
            scenario,
            reason,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_scenario_failure(&self, scenario: &str, error: &HarnessError, elapsed: Duration) {
        tracing::error!(
            phase = "harness",
            event = "scenario_failure",
            scenario,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_run_aborted(&self, scenario: &str, error: &HarnessError) {
        tracing::error!(
            phase = "harness",
            event = "run_aborted",
            scenario,
            error_kind = ?error.kind,
            error = %error
        );
    }
}

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use pcommon::EndpointLabel;
use pharness::{HarnessError, HarnessRuntimeHooks};
use ptransport::{TransportError, TransportOperationHooks};

/// Swallows panics raised by the wrapped transport hooks.
pub struct SafeTransportHooks<H> {
    inner: H,
}

impl<H> SafeTransportHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> TransportOperationHooks for SafeTransportHooks<H>
where
    H: TransportOperationHooks,
{
    fn on_attempt_start(&self, endpoint: &EndpointLabel, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(endpoint, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        endpoint: &EndpointLabel,
        attempt: u32,
        delay: Duration,
        error: &TransportError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(endpoint, attempt, delay, error)
        }));
    }

    fn on_success(&self, endpoint: &EndpointLabel, attempts: u32, status: u16) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(endpoint, attempts, status)
        }));
    }

    fn on_failure(&self, endpoint: &EndpointLabel, attempts: u32, error: &TransportError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(endpoint, attempts, error)
        }));
    }
}

pub struct SafeHarnessHooks<H> {
    inner: H,
}

impl<H> SafeHarnessHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> HarnessRuntimeHooks for SafeHarnessHooks<H>
where
    H: HarnessRuntimeHooks,
{
    fn on_scenario_start(&self, scenario: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_scenario_start(scenario)));
    }

    fn on_scenario_success(&self, scenario: &str, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_scenario_success(scenario, elapsed)
        }));
    }

    fn on_scenario_skipped(&self, scenario: &str, reason: &str, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_scenario_skipped(scenario, reason, elapsed)
        }));
    }

    fn on_scenario_failure(&self, scenario: &str, error: &HarnessError, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_scenario_failure(scenario, error, elapsed)
        }));
    }

    fn on_run_aborted(&self, scenario: &str, error: &HarnessError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_run_aborted(scenario, error)
        }));
    }
}

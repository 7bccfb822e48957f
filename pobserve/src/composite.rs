//! Forwards every callback to each registered hook in order.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pobserve::{FanoutTransportHooks, MetricsObservabilityHooks, TracingObservabilityHooks};
//!
//! let hooks = FanoutTransportHooks::new()
//!     .with(Arc::new(TracingObservabilityHooks))
//!     .with(Arc::new(MetricsObservabilityHooks));
//! assert_eq!(hooks.len(), 2);
//! ```

use std::sync::Arc;
use std::time::Duration;

use pcommon::EndpointLabel;
use pharness::{HarnessError, HarnessRuntimeHooks};
use ptransport::{TransportError, TransportOperationHooks};

#[derive(Default, Clone)]
pub struct FanoutTransportHooks {
    hooks: Vec<Arc<dyn TransportOperationHooks>>,
}

impl FanoutTransportHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hooks: Arc<dyn TransportOperationHooks>) -> Self {
        self.hooks.push(hooks);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl TransportOperationHooks for FanoutTransportHooks {
    fn on_attempt_start(&self, endpoint: &EndpointLabel, attempt: u32) {
        for hooks in &self.hooks {
            hooks.on_attempt_start(endpoint, attempt);
        }
    }

    fn on_retry_scheduled(
        &self,
        endpoint: &EndpointLabel,
        attempt: u32,
        delay: Duration,
        error: &TransportError,
    ) {
        for hooks in &self.hooks {
            hooks.on_retry_scheduled(endpoint, attempt, delay, error);
        }
    }

    fn on_success(&self, endpoint: &EndpointLabel, attempts: u32, status: u16) {
        for hooks in &self.hooks {
            hooks.on_success(endpoint, attempts, status);
        }
    }

    fn on_failure(&self, endpoint: &EndpointLabel, attempts: u32, error: &TransportError) {
        for hooks in &self.hooks {
            hooks.on_failure(endpoint, attempts, error);
        }
    }
}

#[derive(Default, Clone)]
pub struct FanoutHarnessHooks {
    hooks: Vec<Arc<dyn HarnessRuntimeHooks>>,
}

impl FanoutHarnessHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hooks: Arc<dyn HarnessRuntimeHooks>) -> Self {
        self.hooks.push(hooks);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl HarnessRuntimeHooks for FanoutHarnessHooks {
    fn on_scenario_start(&self, scenario: &str) {
        for hooks in &self.hooks {
            hooks.on_scenario_start(scenario);
        }
    }

    fn on_scenario_success(&self, scenario: &str, elapsed: Duration) {
        for hooks in &self.hooks {
            hooks.on_scenario_success(scenario, elapsed);
        }
    }

    fn on_scenario_skipped(&self, scenario: &str, reason: &str, elapsed: Duration) {
        for hooks in &self.hooks {
            hooks.on_scenario_skipped(scenario, reason, elapsed);
        }
    }

    fn on_scenario_failure(&self, scenario: &str, error: &HarnessError, elapsed: Duration) {
        for hooks in &self.hooks {
            hooks.on_scenario_failure(scenario, error, elapsed);
        }
    }

    fn on_run_aborted(&self, scenario: &str, error: &HarnessError) {
        for hooks in &self.hooks {
            hooks.on_run_aborted(scenario, error);
        }
    }
}

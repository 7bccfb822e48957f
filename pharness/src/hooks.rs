//! Runtime hook contracts for observing scenario execution.
//!
//! ```rust
//! use pharness::{HarnessRuntimeHooks, NoopHarnessRuntimeHooks};
//!
//! fn accepts_hooks(_hooks: &dyn HarnessRuntimeHooks) {}
//!
//! let hooks = NoopHarnessRuntimeHooks;
//! accepts_hooks(&hooks);
//! ```

use std::time::Duration;

use crate::HarnessError;

pub trait HarnessRuntimeHooks: Send + Sync {
    fn on_scenario_start(&self, _scenario: &str) {}

    fn on_scenario_success(&self, _scenario: &str, _elapsed: Duration) {}

    fn on_scenario_skipped(&self, _scenario: &str, _reason: &str, _elapsed: Duration) {}

    fn on_scenario_failure(&self, _scenario: &str, _error: &HarnessError, _elapsed: Duration) {}

    fn on_run_aborted(&self, _scenario: &str, _error: &HarnessError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHarnessRuntimeHooks;

impl HarnessRuntimeHooks for NoopHarnessRuntimeHooks {}

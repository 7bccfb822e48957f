//! Runner policy and report types.
//!
//! ```rust
//! use pharness::{Checkpoint, FailFastPolicy};
//!
//! let policy = FailFastPolicy::default();
//! assert!(policy.aborts_on(Checkpoint::HealthCheck));
//! assert!(policy.aborts_on(Checkpoint::Login));
//! assert!(!policy.aborts_on(Checkpoint::None));
//!
//! let lenient = FailFastPolicy::never();
//! assert!(!lenient.aborts_on(Checkpoint::Login));
//! ```

use std::time::Duration;

use crate::{HarnessError, RunSummary};

/// Foundational stages whose failure can end the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Checkpoint {
    #[default]
    None,
    HealthCheck,
    Login,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailFastPolicy {
    pub on_health_check_failure: bool,
    pub on_login_failure: bool,
}

impl Default for FailFastPolicy {
    fn default() -> Self {
        Self {
            on_health_check_failure: true,
            on_login_failure: true,
        }
    }
}

impl FailFastPolicy {
    pub fn never() -> Self {
        Self {
            on_health_check_failure: false,
            on_login_failure: false,
        }
    }

    pub fn aborts_on(&self, checkpoint: Checkpoint) -> bool {
        match checkpoint {
            Checkpoint::None => false,
            Checkpoint::HealthCheck => self.on_health_check_failure,
            Checkpoint::Login => self.on_login_failure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Passed,
    Failed(HarnessError),
    Skipped(String),
    /// An earlier checkpoint aborted the run.
    NotRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub name: String,
    pub checkpoint: Checkpoint,
    pub status: StageStatus,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortReason {
    pub stage: String,
    pub error: HarnessError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub summary: RunSummary,
    pub stages: Vec<StageReport>,
    pub aborted: Option<AbortReason>,
}

impl RunReport {
    /// Not aborted, no failure recorded, and no logged-out token accepted.
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.summary.failure == 0 && self.summary.token_still_valid == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|stage| stage.name == name)
    }
}

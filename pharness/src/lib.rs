//! Smoke-test harness core: session state, result tracking, request
//! execution with retry, scenario contract, and the checkpointed runner.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pharness::{
//!     ExecutorConfig, NoopRunReporter, RequestExecutor, ScenarioContext,
//! };
//! use ptransport::ReqwestTransport;
//!
//! let transport = ReqwestTransport::new(Default::default());
//! let executor = RequestExecutor::new(
//!     Arc::new(transport),
//!     ExecutorConfig::new("http://localhost:3000"),
//! );
//! let ctx = ScenarioContext::new(Arc::new(executor), Arc::new(NoopRunReporter));
//!
//! assert!(!ctx.session.is_authenticated());
//! assert_eq!(ctx.tracker.total(), 0);
//! ```

mod descriptor;
mod error;
mod executor;
mod hooks;
mod reporter;
mod runner;
mod scenario;
mod session;
mod tracker;
mod types;

pub use descriptor::{BearerAuth, ExpectedStatus, RequestDescriptor, ResponseFormat};
pub use error::{HarnessError, HarnessErrorKind};
pub use executor::{
    DEFAULT_STREAM_WINDOW, DEFAULT_TRACED_PATHS, ExecutionOutcome, ExecutorConfig,
    NON_JSON_PREVIEW_CHARS, RequestExecutor, StreamOptions, StreamOutcome,
};
pub use hooks::{HarnessRuntimeHooks, NoopHarnessRuntimeHooks};
pub use reporter::{
    NoopRunReporter, RecordingRunReporter, ReportLevel, RunReporter, report_summary,
};
pub use runner::{Runner, RunnerBuilder};
pub use scenario::{Scenario, ScenarioContext, ScenarioOutcome};
pub use session::{SessionMessage, SessionState};
pub use tracker::{
    ResultTracker, RunSummary, TrackedFailure, TrackedNote, TrackedWarning, WarningKind,
};
pub use types::{AbortReason, Checkpoint, FailFastPolicy, RunReport, StageReport, StageStatus};

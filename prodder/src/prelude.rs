//! Common imports for driving a smoke-test run.

pub use crate::scenarios::{
    ChatScenario, DiagnosticsScenario, HealthScenario, InvalidationScenario, KnowledgeScenario,
    LoginScenario, LogoutScenario, ProfileScenario, RefreshScenario, SessionLifecycleScenario,
    ValidateScenario,
};
pub use crate::{
    ConsoleReporter, Credentials, Probe, ProbeConfig, ProbeOutcome, RunMode, ScenarioName,
    scenario_order,
};
pub use pharness::{
    Checkpoint, HarnessError, HarnessErrorKind, RecordingRunReporter, RequestDescriptor,
    ResultTracker, RunReport, RunReporter, RunSummary, Runner, Scenario, ScenarioContext,
    ScenarioOutcome, SessionState, WarningKind,
};
pub use ptransport::{ApiKeyHeader, HttpTransport, RetryPolicy, Sleeper, TransportError};

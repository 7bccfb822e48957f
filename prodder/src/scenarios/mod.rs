//! Concrete scenarios, one per capability of the API under test.
//!
//! Scenarios share nothing but the [`ScenarioContext`]: tokens and resource
//! ids flow from one to the next through its session state.

mod auth;
mod chat;
mod diagnostics;
mod health;
mod knowledge;
mod sessions;

pub use auth::{
    InvalidationScenario, LoginScenario, LogoutScenario, ProfileScenario, RefreshScenario,
    ValidateScenario,
};
pub use chat::ChatScenario;
pub use diagnostics::DiagnosticsScenario;
pub use health::HealthScenario;
pub use knowledge::KnowledgeScenario;
pub use sessions::SessionLifecycleScenario;

use pharness::{ExecutionOutcome, HarnessError, RequestDescriptor, ScenarioContext};

/// Why a call did not produce the expected status, for the scenario verdict.
pub(crate) fn failure_detail(outcome: &ExecutionOutcome) -> String {
    if outcome.skipped {
        return "not authenticated".to_string();
    }
    if let Some(error) = &outcome.transport_error {
        return format!("request error: {}", error.message);
    }
    if let Some(error) = &outcome.body_error {
        return format!("invalid response body: {}", error.message);
    }
    match outcome.status() {
        Some(status) => match outcome.error_field() {
            Some(detail) => format!("unexpected status {status}: {detail}"),
            None => format!("unexpected status {status}"),
        },
        None => "no response".to_string(),
    }
}

/// Result of calling an endpoint that may legitimately be absent.
pub(crate) enum Optional {
    Available(ExecutionOutcome),
    NotImplemented,
    Unavailable(HarnessError),
}

/// Treats a 404 as "not implemented" and records any other mismatch as a
/// failure.
pub(crate) async fn call_optional(
    ctx: &mut ScenarioContext,
    descriptor: RequestDescriptor,
) -> Optional {
    let label = descriptor.label();
    let outcome = ctx.request(descriptor.allow_failure()).await;
    if outcome.matched {
        return Optional::Available(outcome);
    }

    match outcome.status() {
        Some(404) => {
            ctx.reporter.warn(&format!("{label} is not implemented"));
            ctx.tracker
                .record_not_implemented(label, "endpoint returned 404");
            Optional::NotImplemented
        }
        Some(_) => {
            let detail = failure_detail(&outcome);
            ctx.reporter.error(&format!("{label}: {detail}"));
            ctx.tracker.record_failure(label, detail.clone());
            Optional::Unavailable(HarnessError::protocol(detail))
        }
        None if outcome.skipped => {
            Optional::Unavailable(HarnessError::not_authenticated(failure_detail(&outcome)))
        }
        None => Optional::Unavailable(HarnessError::transport(failure_detail(&outcome))),
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

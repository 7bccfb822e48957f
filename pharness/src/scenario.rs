//! Scenario contract and the per-run context every scenario mutates.

use std::sync::Arc;

use pcommon::{BoxFuture, EndpointLabel};

use crate::{
    ExecutionOutcome, HarnessError, RequestDescriptor, RequestExecutor, ResultTracker,
    RunReporter, SessionState, StreamOptions, StreamOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Passed,
    Failed(HarnessError),
    /// A prerequisite was missing; nothing conclusive happened.
    Skipped(String),
}

impl ScenarioOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, ScenarioOutcome::Passed)
    }

    pub fn failed(error: HarnessError) -> Self {
        ScenarioOutcome::Failed(error)
    }
}

pub trait Scenario: Send + Sync {
    fn name(&self) -> &str;

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome>;
}

/// Explicit state handed to every scenario in turn.
pub struct ScenarioContext {
    pub executor: Arc<RequestExecutor>,
    pub session: SessionState,
    pub tracker: ResultTracker,
    pub reporter: Arc<dyn RunReporter>,
}

impl ScenarioContext {
    pub fn new(executor: Arc<RequestExecutor>, reporter: Arc<dyn RunReporter>) -> Self {
        Self {
            executor,
            session: SessionState::new(),
            tracker: ResultTracker::new(),
            reporter,
        }
    }

    pub async fn request(&mut self, descriptor: RequestDescriptor) -> ExecutionOutcome {
        let executor = Arc::clone(&self.executor);
        executor
            .execute(&self.session, &mut self.tracker, descriptor)
            .await
    }

    pub async fn stream(
        &mut self,
        descriptor: RequestDescriptor,
        options: StreamOptions,
    ) -> StreamOutcome {
        let executor = Arc::clone(&self.executor);
        executor
            .execute_stream(&self.session, &mut self.tracker, descriptor, options)
            .await
    }

    /// Records each dependent step as skipped so it still shows up in the report.
    pub fn skip_steps<I, L>(&mut self, labels: I, reason: &str)
    where
        I: IntoIterator<Item = L>,
        L: Into<EndpointLabel>,
    {
        for label in labels {
            let label = label.into();
            self.reporter.warn(&format!("{label} skipped: {reason}"));
            self.tracker.record_skipped(label, reason);
        }
    }

    /// Records a deferred success once the body checked out.
    pub fn pass(&mut self, label: impl Into<EndpointLabel>, message: &str) {
        self.reporter.success(message);
        self.tracker.record_success(label);
    }

    /// Records a semantic violation found in an otherwise successful response.
    pub fn protocol_failure(
        &mut self,
        label: impl Into<EndpointLabel>,
        message: impl Into<String>,
    ) -> HarnessError {
        let message = message.into();
        self.reporter.error(&message);
        self.tracker.record_failure(label, message.clone());
        HarnessError::protocol(message)
    }
}

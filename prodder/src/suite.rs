//! Suite composition: picks the scenarios for a run mode and wires the
//! executor, hooks, and runner together.

use std::sync::Arc;

use pharness::{
    Checkpoint, HarnessError, HarnessRuntimeHooks, NoopRunReporter, RequestExecutor, ResultTracker,
    RunReport, RunReporter, Runner, Scenario, ScenarioContext, SessionState, StreamOptions,
};
use pobserve::{
    FanoutHarnessHooks, FanoutTransportHooks, MetricsObservabilityHooks, SafeHarnessHooks,
    SafeTransportHooks, TracingObservabilityHooks,
};
use ptransport::{HttpTransport, Sleeper, TransportOperationHooks};

use crate::config::{ProbeConfig, RunMode, ScenarioName};
use crate::scenarios::{
    ChatScenario, DiagnosticsScenario, HealthScenario, InvalidationScenario, KnowledgeScenario,
    LoginScenario, LogoutScenario, ProfileScenario, RefreshScenario, SessionLifecycleScenario,
    ValidateScenario,
};

const FULL_ORDER: [ScenarioName; 11] = [
    ScenarioName::Health,
    ScenarioName::Login,
    ScenarioName::Validate,
    ScenarioName::Profile,
    ScenarioName::Diagnostics,
    ScenarioName::Chat,
    ScenarioName::Sessions,
    ScenarioName::Knowledge,
    ScenarioName::Refresh,
    ScenarioName::Logout,
    ScenarioName::Invalidation,
];

/// Scenarios a run executes, in order.
pub fn scenario_order(mode: RunMode, include_diagnostics: bool) -> Vec<ScenarioName> {
    match mode {
        RunMode::Full => FULL_ORDER
            .into_iter()
            .filter(|name| include_diagnostics || *name != ScenarioName::Diagnostics)
            .collect(),
        RunMode::LoginOnly => vec![ScenarioName::Health, ScenarioName::Login],
        RunMode::Single(ScenarioName::Health) => vec![ScenarioName::Health],
        RunMode::Single(ScenarioName::Login) => vec![ScenarioName::Health, ScenarioName::Login],
        RunMode::Single(ScenarioName::Logout | ScenarioName::Invalidation) => vec![
            ScenarioName::Health,
            ScenarioName::Login,
            ScenarioName::Logout,
            ScenarioName::Invalidation,
        ],
        RunMode::Single(name) => vec![ScenarioName::Health, ScenarioName::Login, name],
    }
}

/// Tracing and metrics hooks, each shielded from panics.
pub fn default_transport_hooks() -> Arc<dyn TransportOperationHooks> {
    Arc::new(
        FanoutTransportHooks::new()
            .with(Arc::new(SafeTransportHooks::new(TracingObservabilityHooks)))
            .with(Arc::new(SafeTransportHooks::new(MetricsObservabilityHooks))),
    )
}

pub fn default_harness_hooks() -> Arc<dyn HarnessRuntimeHooks> {
    Arc::new(
        FanoutHarnessHooks::new()
            .with(Arc::new(SafeHarnessHooks::new(TracingObservabilityHooks)))
            .with(Arc::new(SafeHarnessHooks::new(MetricsObservabilityHooks))),
    )
}

/// Everything a finished run leaves behind.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub report: RunReport,
    pub tracker: ResultTracker,
    pub session: SessionState,
}

pub struct Probe {
    config: ProbeConfig,
    transport: Arc<dyn HttpTransport>,
    reporter: Arc<dyn RunReporter>,
    sleeper: Option<Arc<dyn Sleeper>>,
    transport_hooks: Arc<dyn TransportOperationHooks>,
    harness_hooks: Arc<dyn HarnessRuntimeHooks>,
    print_summary: bool,
}

impl Probe {
    pub fn new(config: ProbeConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            reporter: Arc::new(NoopRunReporter),
            sleeper: None,
            transport_hooks: default_transport_hooks(),
            harness_hooks: default_harness_hooks(),
            print_summary: true,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn RunReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn with_transport_hooks(mut self, hooks: Arc<dyn TransportOperationHooks>) -> Self {
        self.transport_hooks = hooks;
        self
    }

    pub fn with_harness_hooks(mut self, hooks: Arc<dyn HarnessRuntimeHooks>) -> Self {
        self.harness_hooks = hooks;
        self
    }

    pub fn with_print_summary(mut self, print_summary: bool) -> Self {
        self.print_summary = print_summary;
        self
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn scenarios(&self) -> Vec<ScenarioName> {
        scenario_order(self.config.mode, self.config.include_diagnostics)
    }

    fn scenario(&self, name: ScenarioName) -> Arc<dyn Scenario> {
        let stream = StreamOptions {
            window: self.config.stream_window,
            max_events: None,
        };
        match name {
            ScenarioName::Health => Arc::new(HealthScenario),
            ScenarioName::Login => Arc::new(LoginScenario::new(self.config.credentials.clone())),
            ScenarioName::Validate => Arc::new(ValidateScenario),
            ScenarioName::Profile => Arc::new(ProfileScenario),
            ScenarioName::Diagnostics => Arc::new(DiagnosticsScenario),
            ScenarioName::Chat => Arc::new(ChatScenario::new(stream)),
            ScenarioName::Sessions => Arc::new(SessionLifecycleScenario::new()),
            ScenarioName::Knowledge => Arc::new(KnowledgeScenario::new(stream)),
            ScenarioName::Refresh => Arc::new(RefreshScenario),
            ScenarioName::Logout => Arc::new(LogoutScenario),
            ScenarioName::Invalidation => Arc::new(InvalidationScenario),
        }
    }

    pub fn runner(&self) -> Result<Runner, HarnessError> {
        self.scenarios()
            .into_iter()
            .fold(Runner::builder(), |builder, name| {
                let checkpoint = match name {
                    ScenarioName::Health => Checkpoint::HealthCheck,
                    ScenarioName::Login => Checkpoint::Login,
                    _ => Checkpoint::None,
                };
                builder.checkpoint(self.scenario(name), checkpoint)
            })
            .hooks(Arc::clone(&self.harness_hooks))
            .print_summary(self.print_summary)
            .build()
    }

    pub fn executor(&self) -> RequestExecutor {
        let executor = RequestExecutor::new(
            Arc::clone(&self.transport),
            self.config.executor_config(),
        )
        .with_hooks(Arc::clone(&self.transport_hooks))
        .with_reporter(Arc::clone(&self.reporter));
        match &self.sleeper {
            Some(sleeper) => executor.with_sleeper(Arc::clone(sleeper)),
            None => executor,
        }
    }

    pub async fn run(&self) -> Result<ProbeOutcome, HarnessError> {
        self.config.validate()?;
        let runner = self.runner()?;

        self.reporter.header("API smoke test");
        self.reporter
            .info(&format!("Target: {}", self.config.base_url));
        self.reporter.info(&format!(
            "Scenarios: {}",
            self.scenarios()
                .iter()
                .map(|name| name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        let mut ctx = ScenarioContext::new(Arc::new(self.executor()), Arc::clone(&self.reporter));
        let report = runner.run(&mut ctx).await;

        Ok(ProbeOutcome {
            report,
            tracker: ctx.tracker,
            session: ctx.session,
        })
    }
}

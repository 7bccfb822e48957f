//! Runner: executes scenarios in their fixed order and stops at failed
//! checkpoints.

use std::sync::Arc;
use std::time::Instant;

use crate::{
    AbortReason, Checkpoint, FailFastPolicy, HarnessError, HarnessRuntimeHooks,
    NoopHarnessRuntimeHooks, RunReport, Scenario, ScenarioContext, ScenarioOutcome, StageReport,
    StageStatus, report_summary,
};

struct Stage {
    scenario: Arc<dyn Scenario>,
    checkpoint: Checkpoint,
}

pub struct RunnerBuilder {
    stages: Vec<Stage>,
    fail_fast: FailFastPolicy,
    hooks: Arc<dyn HarnessRuntimeHooks>,
    print_summary: bool,
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunnerBuilder {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            fail_fast: FailFastPolicy::default(),
            hooks: Arc::new(NoopHarnessRuntimeHooks),
            print_summary: true,
        }
    }

    pub fn health_check(self, scenario: Arc<dyn Scenario>) -> Self {
        self.checkpoint(scenario, Checkpoint::HealthCheck)
    }

    pub fn login(self, scenario: Arc<dyn Scenario>) -> Self {
        self.checkpoint(scenario, Checkpoint::Login)
    }

    pub fn stage(self, scenario: Arc<dyn Scenario>) -> Self {
        self.checkpoint(scenario, Checkpoint::None)
    }

    pub fn checkpoint(mut self, scenario: Arc<dyn Scenario>, checkpoint: Checkpoint) -> Self {
        self.stages.push(Stage {
            scenario,
            checkpoint,
        });
        self
    }

    pub fn fail_fast(mut self, fail_fast: FailFastPolicy) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn HarnessRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn print_summary(mut self, print_summary: bool) -> Self {
        self.print_summary = print_summary;
        self
    }

    pub fn build(self) -> Result<Runner, HarnessError> {
        if self.stages.is_empty() {
            return Err(HarnessError::invalid_request(
                "runner requires at least one scenario",
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.scenario.name().to_string()) {
                return Err(HarnessError::invalid_request(format!(
                    "scenario '{}' is registered twice",
                    stage.scenario.name()
                )));
            }
        }

        Ok(Runner {
            stages: self.stages,
            fail_fast: self.fail_fast,
            hooks: self.hooks,
            print_summary: self.print_summary,
        })
    }
}

pub struct Runner {
    stages: Vec<Stage>,
    fail_fast: FailFastPolicy,
    hooks: Arc<dyn HarnessRuntimeHooks>,
    print_summary: bool,
}

impl Runner {
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::new()
    }

    pub fn scenario_names(&self) -> Vec<&str> {
        self.stages
            .iter()
            .map(|stage| stage.scenario.name())
            .collect()
    }

    pub async fn run(&self, ctx: &mut ScenarioContext) -> RunReport {
        let mut stages = Vec::with_capacity(self.stages.len());
        let mut aborted = None::<AbortReason>;

        for stage in &self.stages {
            let name = stage.scenario.name().to_string();
            if aborted.is_some() {
                stages.push(StageReport {
                    name,
                    checkpoint: stage.checkpoint,
                    status: StageStatus::NotRun,
                    elapsed: std::time::Duration::ZERO,
                });
                continue;
            }

            self.hooks.on_scenario_start(&name);
            let started = Instant::now();
            let outcome = stage.scenario.run(ctx).await;
            let elapsed = started.elapsed();

            let status = match outcome {
                ScenarioOutcome::Passed => {
                    self.hooks.on_scenario_success(&name, elapsed);
                    StageStatus::Passed
                }
                ScenarioOutcome::Skipped(reason) => {
                    self.hooks.on_scenario_skipped(&name, &reason, elapsed);
                    StageStatus::Skipped(reason)
                }
                ScenarioOutcome::Failed(error) => {
                    self.hooks.on_scenario_failure(&name, &error, elapsed);
                    if self.fail_fast.aborts_on(stage.checkpoint) {
                        ctx.reporter.error(&format!(
                            "{name} failed, aborting remaining scenarios: {}",
                            error.message
                        ));
                        self.hooks.on_run_aborted(&name, &error);
                        aborted = Some(AbortReason {
                            stage: name.clone(),
                            error: error.clone(),
                        });
                    }
                    StageStatus::Failed(error)
                }
            };

            stages.push(StageReport {
                name,
                checkpoint: stage.checkpoint,
                status,
                elapsed,
            });
        }

        if self.print_summary {
            report_summary(ctx.reporter.as_ref(), &ctx.tracker);
        }

        RunReport {
            summary: ctx.tracker.summary(),
            stages,
            aborted,
        }
    }
}

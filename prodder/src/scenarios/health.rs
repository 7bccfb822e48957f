use pcommon::BoxFuture;
use pharness::{HarnessError, RequestDescriptor, Scenario, ScenarioContext, ScenarioOutcome};

use crate::api::{self, HealthResponse, decode};
use crate::scenarios::failure_detail;

/// `GET /health` must answer 200 with `status == "ok"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HealthScenario;

impl Scenario for HealthScenario {
    fn name(&self) -> &str {
        "health"
    }

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome> {
        Box::pin(async move {
            ctx.reporter.section("Health check");
            let descriptor = RequestDescriptor::get(api::HEALTH)
                .error_message("health check failed")
                .defer_success();
            let label = descriptor.label();

            let outcome = ctx.request(descriptor).await;
            if !outcome.matched {
                return ScenarioOutcome::failed(HarnessError::health_check(failure_detail(
                    &outcome,
                )));
            }

            let status = outcome
                .body
                .as_ref()
                .and_then(|body| decode::<HealthResponse>(body).ok())
                .and_then(|health| health.status);
            match status.as_deref() {
                Some("ok") => {
                    ctx.pass(label, "server is healthy");
                    ScenarioOutcome::Passed
                }
                other => {
                    let error = ctx.protocol_failure(
                        label,
                        format!("health status is {}", other.unwrap_or("missing")),
                    );
                    ScenarioOutcome::failed(HarnessError::health_check(error.message))
                }
            }
        })
    }
}

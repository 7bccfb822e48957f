//! Opt-in diagnostic endpoints; each may be missing on a given deployment.

use pcommon::{BoxFuture, MetadataMap};
use pharness::{RequestDescriptor, Scenario, ScenarioContext, ScenarioOutcome};
use serde_json::Value;

use crate::api::{self, DatabaseDiagnostic, decode};
use crate::scenarios::{Optional, call_optional};

#[derive(Debug, Default, Clone, Copy)]
pub struct DiagnosticsScenario;

/// Top-level scalar fields of a diagnostic payload, rendered as text.
pub fn scalar_fields(body: &Value) -> MetadataMap {
    let Some(object) = body.as_object() else {
        return MetadataMap::new();
    };
    object
        .iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::String(text) => text.clone(),
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                _ => return None,
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

impl Scenario for DiagnosticsScenario {
    fn name(&self) -> &str {
        "diagnostics"
    }

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome> {
        Box::pin(async move {
            ctx.reporter.section("Diagnostics");
            let mut first_error = None;

            match call_optional(ctx, RequestDescriptor::get(api::DIAGNOSTIC_ENVIRONMENT)).await {
                Optional::Available(outcome) => {
                    ctx.reporter.success("environment diagnostics available");
                    let mut fields = outcome
                        .body
                        .as_ref()
                        .map(scalar_fields)
                        .unwrap_or_default()
                        .into_iter()
                        .collect::<Vec<_>>();
                    fields.sort();
                    for (key, value) in fields {
                        ctx.reporter.info(&format!("{key}: {value}"));
                    }
                }
                Optional::NotImplemented => {}
                Optional::Unavailable(error) => {
                    first_error.get_or_insert(error);
                }
            }

            match call_optional(ctx, RequestDescriptor::get(api::DIAGNOSTIC_DATABASE)).await {
                Optional::Available(outcome) => {
                    let database = outcome
                        .body
                        .as_ref()
                        .and_then(|body| decode::<DatabaseDiagnostic>(body).ok())
                        .unwrap_or_default();
                    match (database.success, database.error) {
                        (Some(false), error) | (None, error @ Some(_)) => {
                            ctx.reporter.warn(&format!(
                                "database reported a problem: {}",
                                error.as_deref().unwrap_or("no detail")
                            ));
                        }
                        _ => ctx.reporter.success("database is reachable"),
                    }
                }
                Optional::NotImplemented => {}
                Optional::Unavailable(error) => {
                    first_error.get_or_insert(error);
                }
            }

            match call_optional(ctx, RequestDescriptor::get(api::DIAGNOSTIC_SYSTEM)).await {
                Optional::Available(outcome) => {
                    ctx.reporter.success("system diagnostics available");
                    if let Some(body) = &outcome.body {
                        ctx.reporter.debug_json("system", body);
                    }
                }
                Optional::NotImplemented => {}
                Optional::Unavailable(error) => {
                    first_error.get_or_insert(error);
                }
            }

            match first_error {
                None => ScenarioOutcome::Passed,
                Some(error) => ScenarioOutcome::failed(error),
            }
        })
    }
}

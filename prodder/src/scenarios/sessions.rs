//! Chat session lifecycle: create, read, mutate, delete, and delete again.

use pcommon::{BoxFuture, EndpointLabel, ResourceId};
use pharness::{
    HarnessError, RequestDescriptor, Scenario, ScenarioContext, ScenarioOutcome, SessionMessage,
};
use serde_json::Value;

use crate::api::{
    self, AddMessageRequest, CreateSessionRequest, SessionRecord, SuccessResponse,
    UpdateSessionRequest, decode, encode,
};
use crate::scenarios::failure_detail;

pub const DEFAULT_INITIAL_TITLE: &str = "Smoke test session";
pub const DEFAULT_UPDATED_TITLE: &str = "Smoke test session (renamed)";
const UPDATED_DESCRIPTION: &str = "Updated by the smoke test";
const MESSAGE_CONTENT: &str = "Hello, please introduce this API";

/// Labels of the steps that need the id returned by create, in call order.
pub fn dependent_steps() -> [EndpointLabel; 9] {
    [
        "GET /api/sessions".into(),
        "GET /api/sessions/{id}".into(),
        "POST /api/sessions/{id}/messages".into(),
        "DELETE /api/sessions/{id}/messages".into(),
        "PUT /api/sessions/{id}".into(),
        "GET /api/sessions/{id} after update".into(),
        "DELETE /api/sessions/{id}".into(),
        "GET /api/sessions/{id} after delete".into(),
        "DELETE /api/sessions/{id} again".into(),
    ]
}

#[derive(Debug, Clone)]
pub struct SessionLifecycleScenario {
    initial_title: String,
    updated_title: String,
}

impl Default for SessionLifecycleScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLifecycleScenario {
    pub fn new() -> Self {
        Self::with_titles(DEFAULT_INITIAL_TITLE, DEFAULT_UPDATED_TITLE)
    }

    pub fn with_titles(initial: impl Into<String>, updated: impl Into<String>) -> Self {
        Self {
            initial_title: initial.into(),
            updated_title: updated.into(),
        }
    }

    async fn create(&self, ctx: &mut ScenarioContext) -> Result<ResourceId, HarnessError> {
        let descriptor = RequestDescriptor::post(api::SESSIONS)
            .json(encode(&CreateSessionRequest {
                title: &self.initial_title,
            }))
            .authenticated()
            .expect_any_status([200, 201])
            .error_message("create session failed")
            .defer_success();
        let label = descriptor.label();

        let outcome = ctx.request(descriptor).await;
        if !outcome.matched {
            return Err(HarnessError::protocol(failure_detail(&outcome)));
        }

        let record = outcome
            .body
            .as_ref()
            .and_then(|body| decode::<SessionRecord>(body).ok());
        match record.and_then(|record| record.id) {
            Some(id) => {
                let id = ResourceId::from(id);
                ctx.pass(label, &format!("created session {id}"));
                Ok(id)
            }
            None => Err(ctx.protocol_failure(label, "create session response is missing id")),
        }
    }

    async fn expect_title(
        ctx: &mut ScenarioContext,
        id: &ResourceId,
        label: &str,
        expected: &str,
    ) -> Result<(), HarnessError> {
        let descriptor = RequestDescriptor::get(api::session_path(id))
            .authenticated()
            .error_message("get session failed")
            .with_label(label)
            .defer_success();
        let label = descriptor.label();

        let outcome = ctx.request(descriptor).await;
        if !outcome.matched {
            return Err(HarnessError::protocol(failure_detail(&outcome)));
        }

        let title = outcome
            .body
            .as_ref()
            .and_then(|body| decode::<SessionRecord>(body).ok())
            .and_then(|record| record.title);
        match title.as_deref() {
            Some(title) if title == expected => {
                ctx.pass(label, &format!("session title is '{title}'"));
                Ok(())
            }
            other => Err(ctx.protocol_failure(
                label,
                format!(
                    "expected title '{expected}', got '{}'",
                    other.unwrap_or("<missing>")
                ),
            )),
        }
    }

    async fn expect_success_flag(
        ctx: &mut ScenarioContext,
        descriptor: RequestDescriptor,
        what: &str,
    ) -> Result<SuccessResponse, HarnessError> {
        let descriptor = descriptor.defer_success();
        let label = descriptor.label();

        let outcome = ctx.request(descriptor).await;
        if !outcome.matched {
            return Err(HarnessError::protocol(failure_detail(&outcome)));
        }

        let response = outcome
            .body
            .as_ref()
            .and_then(|body| decode::<SuccessResponse>(body).ok())
            .unwrap_or_default();
        if response.success == Some(true) {
            ctx.pass(label, what);
            Ok(response)
        } else {
            Err(ctx.protocol_failure(label, format!("{what}: response did not report success")))
        }
    }

    async fn expect_updated_title(
        ctx: &mut ScenarioContext,
        descriptor: RequestDescriptor,
        expected: &str,
    ) -> Result<(), HarnessError> {
        let descriptor = descriptor.defer_success();
        let label = descriptor.label();

        let outcome = ctx.request(descriptor).await;
        if !outcome.matched {
            return Err(HarnessError::protocol(failure_detail(&outcome)));
        }

        let title = outcome
            .body
            .as_ref()
            .and_then(|body| decode::<SessionRecord>(body).ok())
            .and_then(|record| record.title);
        if title.as_deref() == Some(expected) {
            ctx.pass(label, &format!("session renamed to '{expected}'"));
            Ok(())
        } else {
            Err(ctx.protocol_failure(
                label,
                format!("update did not return title '{expected}'"),
            ))
        }
    }

    async fn list(ctx: &mut ScenarioContext) -> Result<(), HarnessError> {
        let descriptor = RequestDescriptor::get(api::SESSIONS)
            .authenticated()
            .error_message("list sessions failed")
            .defer_success();
        let label = descriptor.label();

        let outcome = ctx.request(descriptor).await;
        if !outcome.matched {
            return Err(HarnessError::protocol(failure_detail(&outcome)));
        }
        match &outcome.body {
            Some(Value::Array(sessions)) => {
                let count = sessions.len();
                ctx.pass(label, &format!("listed {count} session(s)"));
                Ok(())
            }
            _ => Err(ctx.protocol_failure(label, "session list is not an array")),
        }
    }

    async fn read_after_delete(
        ctx: &mut ScenarioContext,
        id: &ResourceId,
    ) -> Result<(), HarnessError> {
        let label = "GET /api/sessions/{id} after delete";
        let outcome = ctx
            .request(
                RequestDescriptor::get(api::session_path(id))
                    .authenticated()
                    .allow_failure()
                    .raw_response()
                    .with_label(label)
                    .defer_success(),
            )
            .await;

        match outcome.status() {
            Some(200) => {
                let message = "deleted session is still readable";
                ctx.reporter.error(message);
                ctx.tracker.record_failure(label, message);
                Err(HarnessError::protocol(message))
            }
            Some(status) => {
                ctx.pass(label, &format!("deleted session answers {status}"));
                Ok(())
            }
            None => Err(HarnessError::transport(failure_detail(&outcome))),
        }
    }
}

impl Scenario for SessionLifecycleScenario {
    fn name(&self) -> &str {
        "sessions"
    }

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome> {
        Box::pin(async move {
            ctx.reporter.section("Session lifecycle");
            if !ctx.session.is_authenticated() {
                ctx.skip_steps(
                    std::iter::once(EndpointLabel::from("POST /api/sessions"))
                        .chain(dependent_steps()),
                    "not authenticated",
                );
                return ScenarioOutcome::Skipped("not authenticated".to_string());
            }

            let id = match self.create(ctx).await {
                Ok(id) => id,
                Err(error) => {
                    ctx.skip_steps(dependent_steps(), "session was not created");
                    return ScenarioOutcome::failed(error);
                }
            };
            ctx.session.set_current_session(id.clone());

            let mut first_error = None::<HarnessError>;
            let mut keep = |result: Result<(), HarnessError>| {
                if let Err(error) = result {
                    first_error.get_or_insert(error);
                }
            };

            keep(Self::list(ctx).await);
            keep(
                Self::expect_title(ctx, &id, "GET /api/sessions/{id}", &self.initial_title)
                    .await,
            );

            let message = SessionMessage::new("user", MESSAGE_CONTENT);
            let added = Self::expect_success_flag(
                ctx,
                RequestDescriptor::post(api::session_messages_path(&id))
                    .json(encode(&AddMessageRequest {
                        role: &message.role,
                        content: &message.content,
                    }))
                    .authenticated()
                    .expect_status(201)
                    .error_message("add message failed")
                    .with_label("POST /api/sessions/{id}/messages"),
                "message added",
            )
            .await;
            if added.is_ok() {
                ctx.session.push_message(message);
            }
            keep(added.map(|_| ()));

            let cleared = Self::expect_success_flag(
                ctx,
                RequestDescriptor::delete(api::session_messages_path(&id))
                    .authenticated()
                    .error_message("clear messages failed")
                    .with_label("DELETE /api/sessions/{id}/messages"),
                "messages cleared",
            )
            .await;
            if cleared.is_ok() {
                ctx.session.messages.clear();
            }
            keep(cleared.map(|_| ()));

            let updated = Self::expect_updated_title(
                ctx,
                RequestDescriptor::put(api::session_path(&id))
                    .json(encode(&UpdateSessionRequest {
                        title: &self.updated_title,
                        description: UPDATED_DESCRIPTION,
                    }))
                    .authenticated()
                    .error_message("update session failed")
                    .with_label("PUT /api/sessions/{id}"),
                &self.updated_title,
            )
            .await;
            keep(updated);
            keep(
                Self::expect_title(
                    ctx,
                    &id,
                    "GET /api/sessions/{id} after update",
                    &self.updated_title,
                )
                .await,
            );

            let deleted = Self::expect_success_flag(
                ctx,
                RequestDescriptor::delete(api::session_path(&id))
                    .authenticated()
                    .error_message("delete session failed")
                    .with_label("DELETE /api/sessions/{id}"),
                "session deleted",
            )
            .await;
            if let Ok(SuccessResponse {
                deleted_count: Some(count),
                ..
            }) = &deleted
            {
                ctx.reporter.info(&format!("Deleted {count} record(s)"));
            }
            keep(deleted.map(|_| ()));

            keep(Self::read_after_delete(ctx, &id).await);

            let again = ctx
                .request(
                    RequestDescriptor::delete(api::session_path(&id))
                        .authenticated()
                        .expect_status(404)
                        .error_message("second delete should report not found")
                        .raw_response()
                        .with_label("DELETE /api/sessions/{id} again"),
                )
                .await;
            if again.matched {
                ctx.reporter.success("second delete reports not found");
            } else {
                keep(Err(HarnessError::protocol(failure_detail(&again))));
            }

            ctx.session.take_current_session();
            match first_error {
                None => ScenarioOutcome::Passed,
                Some(error) => ScenarioOutcome::failed(error),
            }
        })
    }
}

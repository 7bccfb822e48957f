//! Knowledge base: upload, query, chat, and streaming chat.

use pcommon::{BoxFuture, EndpointLabel, preview};
use pharness::{
    HarnessError, RequestDescriptor, Scenario, ScenarioContext, ScenarioOutcome, StreamOptions,
};
use ptransport::{FilePart, MultipartForm};

use crate::api::{
    self, KnowledgeChatRequest, KnowledgeChatResponse, KnowledgeQueryRequest,
    KnowledgeQueryResponse, UploadResponse, decode, encode,
};
use crate::scenarios::failure_detail;

const FALLBACK_USER_ID: &str = "test_user";
const UPLOAD_FILE_NAME: &str = "smoke-test.txt";
const UPLOAD_CONTENTS: &str = "Smoke test document\n\n\
The API exposes login, token refresh, chat sessions, and a knowledge base\n\
that accepts uploads and answers queries.\n";
const QUERY: &str = "API features";
const QUERY_LIMIT: u32 = 3;
const CHAT_PROMPT: &str = "Describe the API features";
const REPLY_PREVIEW_CHARS: usize = 80;

fn steps() -> [EndpointLabel; 4] {
    [
        EndpointLabel::with_method("POST", api::KNOWLEDGE_UPLOAD),
        EndpointLabel::with_method("POST", api::KNOWLEDGE_QUERY),
        EndpointLabel::with_method("POST", api::KNOWLEDGE_CHAT),
        EndpointLabel::with_method("POST", api::KNOWLEDGE_STREAM_CHAT),
    ]
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeScenario {
    stream: StreamOptions,
}

impl KnowledgeScenario {
    pub fn new(stream: StreamOptions) -> Self {
        Self { stream }
    }

    async fn upload(ctx: &mut ScenarioContext, user_id: &str) -> Result<(), HarnessError> {
        let form = MultipartForm::new()
            .file(FilePart::text("file", UPLOAD_FILE_NAME, UPLOAD_CONTENTS))
            .text("userId", user_id)
            .text("description", "uploaded by the smoke test");
        let descriptor = RequestDescriptor::post(api::KNOWLEDGE_UPLOAD)
            .multipart(form)
            .authenticated()
            .expect_any_status([200, 201])
            .allow_failure();
        let label = descriptor.label();

        let outcome = ctx.request(descriptor).await;
        if outcome.matched {
            let stored = outcome
                .body
                .as_ref()
                .and_then(|body| decode::<UploadResponse>(body).ok())
                .and_then(UploadResponse::stored_id);
            match stored {
                Some(id) => {
                    ctx.reporter.success(&format!("uploaded file {id}"));
                    ctx.session.knowledge_file = Some(id);
                }
                None => ctx.reporter.success("file uploaded"),
            }
            return Ok(());
        }

        let message = match outcome.status() {
            Some(_) if outcome.body_error.is_some() => failure_detail(&outcome),
            Some(401) => "authentication failed".to_string(),
            Some(403) => "permission denied".to_string(),
            Some(status) => format!("upload failed with status {status}"),
            None => return Err(HarnessError::transport(failure_detail(&outcome))),
        };
        ctx.reporter.error(&format!("{label}: {message}"));
        ctx.tracker.record_failure(label, message.clone());
        Err(HarnessError::protocol(message))
    }

    async fn query(ctx: &mut ScenarioContext, user_id: &str) -> Result<(), HarnessError> {
        let descriptor = RequestDescriptor::post(api::KNOWLEDGE_QUERY)
            .json(encode(&KnowledgeQueryRequest {
                query: QUERY,
                user_id,
                limit: QUERY_LIMIT,
            }))
            .authenticated()
            .error_message("knowledge query failed")
            .defer_success();
        let label = descriptor.label();

        let outcome = ctx.request(descriptor).await;
        if !outcome.matched {
            return Err(HarnessError::protocol(failure_detail(&outcome)));
        }

        let results = outcome
            .body
            .as_ref()
            .and_then(|body| decode::<KnowledgeQueryResponse>(body).ok())
            .and_then(|response| response.results);
        match results {
            Some(results) => {
                ctx.pass(label, &format!("query returned {} result(s)", results.len()));
                Ok(())
            }
            None => Err(ctx.protocol_failure(label, "query response is missing results")),
        }
    }

    /// A failing knowledge chat is recorded as not implemented.
    async fn chat(ctx: &mut ScenarioContext, user_id: &str) -> Result<(), HarnessError> {
        let descriptor = RequestDescriptor::post(api::KNOWLEDGE_CHAT)
            .json(encode(&KnowledgeChatRequest {
                message: CHAT_PROMPT,
                user_id,
            }))
            .authenticated()
            .allow_failure();
        let label = descriptor.label();

        let outcome = ctx.request(descriptor).await;
        if outcome.matched {
            let reply = outcome
                .body
                .as_ref()
                .and_then(|body| decode::<KnowledgeChatResponse>(body).ok())
                .and_then(|response| response.reply);
            match reply {
                Some(reply) => ctx.reporter.success(&format!(
                    "knowledge chat replied: {}",
                    preview(&reply, REPLY_PREVIEW_CHARS)
                )),
                None => ctx.reporter.warn("knowledge chat answered without a reply"),
            }
            return Ok(());
        }

        match outcome.status() {
            Some(status) => {
                ctx.reporter
                    .warn(&format!("{label} answered {status}; treating as not implemented"));
                ctx.tracker
                    .record_not_implemented(label, format!("endpoint returned {status}"));
                Ok(())
            }
            None => Err(HarnessError::transport(failure_detail(&outcome))),
        }
    }

    async fn stream_chat(
        &self,
        ctx: &mut ScenarioContext,
        user_id: &str,
    ) -> Result<(), HarnessError> {
        let outcome = ctx
            .stream(
                RequestDescriptor::post(api::KNOWLEDGE_STREAM_CHAT)
                    .json(encode(&KnowledgeChatRequest {
                        message: CHAT_PROMPT,
                        user_id,
                    }))
                    .authenticated()
                    .error_message("knowledge stream chat failed"),
                self.stream,
            )
            .await;
        if !outcome.matched {
            return Err(HarnessError::protocol("knowledge stream chat failed"));
        }

        let suffix = if outcome.window_elapsed {
            " before the read window closed"
        } else {
            ""
        };
        ctx.reporter.success(&format!(
            "received {} stream event(s){suffix}",
            outcome.events.len()
        ));
        Ok(())
    }
}

impl Scenario for KnowledgeScenario {
    fn name(&self) -> &str {
        "knowledge"
    }

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome> {
        Box::pin(async move {
            ctx.reporter.section("Knowledge base");
            if !ctx.session.is_authenticated() {
                ctx.skip_steps(steps(), "not authenticated");
                return ScenarioOutcome::Skipped("not authenticated".to_string());
            }

            let user_id = ctx
                .session
                .user_id
                .clone()
                .unwrap_or_else(|| FALLBACK_USER_ID.to_string());

            let results = [
                Self::upload(ctx, &user_id).await,
                Self::query(ctx, &user_id).await,
                Self::chat(ctx, &user_id).await,
                self.stream_chat(ctx, &user_id).await,
            ];
            match results.into_iter().find_map(Result::err) {
                None => ScenarioOutcome::Passed,
                Some(error) => ScenarioOutcome::failed(error),
            }
        })
    }
}

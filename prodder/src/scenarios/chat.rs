use pcommon::{BoxFuture, preview};
use pharness::{
    HarnessError, RequestDescriptor, Scenario, ScenarioContext, ScenarioOutcome, StreamOptions,
};

use crate::api::{self, ChatRequest, encode};
use crate::scenarios::failure_detail;

const SIMPLE_PROMPT: &str = "Hello, please introduce this API";
const STREAM_PROMPT: &str = "Hello, give a short introduction";
const REPLY_PREVIEW_CHARS: usize = 80;

/// Plain chat plus a reachability check of the streaming chat endpoint.
#[derive(Debug, Clone, Default)]
pub struct ChatScenario {
    stream: StreamOptions,
}

impl ChatScenario {
    pub fn new(stream: StreamOptions) -> Self {
        Self { stream }
    }
}

impl Scenario for ChatScenario {
    fn name(&self) -> &str {
        "chat"
    }

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome> {
        Box::pin(async move {
            ctx.reporter.section("Chat");
            let mut first_error = None::<HarnessError>;

            let simple = ctx
                .request(
                    RequestDescriptor::post(api::SIMPLE_CHAT)
                        .json(encode(&ChatRequest {
                            message: SIMPLE_PROMPT,
                        }))
                        .authenticated()
                        .error_message("simple chat failed"),
                )
                .await;
            if simple.matched {
                let reply = simple
                    .str_field("reply")
                    .or_else(|| simple.str_field("message"))
                    .map(|reply| preview(reply, REPLY_PREVIEW_CHARS));
                ctx.reporter.success(&format!(
                    "chat replied: {}",
                    reply.as_deref().unwrap_or("<no reply field>")
                ));
            } else {
                first_error = Some(HarnessError::protocol(failure_detail(&simple)));
            }

            // The first event proves the stream opened; the body is not inspected.
            let streamed = ctx
                .stream(
                    RequestDescriptor::post(api::CHAT_STREAM)
                        .json(encode(&ChatRequest {
                            message: STREAM_PROMPT,
                        }))
                        .authenticated()
                        .error_message("streaming chat failed"),
                    StreamOptions {
                        max_events: Some(1),
                        ..self.stream
                    },
                )
                .await;
            if streamed.matched {
                ctx.reporter.success("streaming chat is reachable");
            } else if first_error.is_none() {
                first_error = Some(HarnessError::protocol(format!(
                    "streaming chat answered {}",
                    streamed
                        .status
                        .map(|status| status.to_string())
                        .unwrap_or_else(|| "nothing".to_string())
                )));
            }

            match first_error {
                None => ScenarioOutcome::Passed,
                Some(error) => ScenarioOutcome::failed(error),
            }
        })
    }
}

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pharness::{
    BearerAuth, ExecutorConfig, ReportLevel, RecordingRunReporter, RequestDescriptor,
    RequestExecutor, ResultTracker, SessionState, StreamOptions,
};
use ptransport::{
    ApiEventStream, ApiKeyHeader, ApiRequest, ApiResponse, EventDataStream, HttpTransport,
    RequestBody, RetryPolicy, Sleeper, TransportError, TransportFuture,
};
use serde_json::json;

#[derive(Debug, Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    stream_events: Mutex<Vec<Result<String, TransportError>>>,
    stream_status: Mutex<u16>,
    captured: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    fn replying(replies: Vec<Result<ApiResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            stream_status: Mutex::new(200),
            ..Self::default()
        })
    }

    fn captured(&self) -> Vec<ApiRequest> {
        self.captured.lock().expect("captured lock").clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: ApiRequest,
    ) -> TransportFuture<'a, Result<ApiResponse, TransportError>> {
        Box::pin(async move {
            self.captured.lock().expect("captured lock").push(request);
            self.replies
                .lock()
                .expect("replies lock")
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::other("no scripted reply")))
        })
    }

    fn stream<'a>(
        &'a self,
        request: ApiRequest,
    ) -> TransportFuture<'a, Result<ApiEventStream<'a>, TransportError>> {
        Box::pin(async move {
            self.captured.lock().expect("captured lock").push(request);
            let status = *self.stream_status.lock().expect("status lock");
            let events = std::mem::take(&mut *self.stream_events.lock().expect("events lock"));
            Ok(ApiEventStream {
                status,
                error_body: (status != 200).then(|| r#"{"error":"stream closed"}"#.to_string()),
                events: Box::pin(futures_util::stream::iter(events)) as EventDataStream<'a>,
            })
        })
    }
}

#[derive(Debug, Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep<'a>(&'a self, delay: Duration) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            self.delays.lock().expect("delays lock").push(delay);
        })
    }
}

fn executor(transport: Arc<ScriptedTransport>, sleeper: Arc<RecordingSleeper>) -> RequestExecutor {
    RequestExecutor::new(transport, ExecutorConfig::new("http://localhost:3000"))
        .with_sleeper(sleeper)
}

#[tokio::test]
async fn two_connection_failures_then_success_makes_three_attempts() {
    let transport = ScriptedTransport::replying(vec![
        Err(TransportError::connect("connection refused")),
        Err(TransportError::connect("connection refused")),
        Ok(ApiResponse::new(200, r#"{"status":"ok"}"#)),
    ]);
    let sleeper = Arc::new(RecordingSleeper::default());
    let executor = executor(Arc::clone(&transport), Arc::clone(&sleeper));
    let mut tracker = ResultTracker::new();

    let outcome = executor
        .execute(&SessionState::new(), &mut tracker, RequestDescriptor::get("/health"))
        .await;

    assert!(outcome.matched);
    assert_eq!(outcome.str_field("status"), Some("ok"));
    assert_eq!(transport.captured().len(), 3);
    assert_eq!(
        *sleeper.delays.lock().expect("delays lock"),
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert_eq!((tracker.total(), tracker.success()), (1, 1));
}

#[tokio::test]
async fn exhausted_retries_record_one_request_error() {
    let transport = ScriptedTransport::replying(vec![
        Err(TransportError::timeout("timed out")),
        Err(TransportError::timeout("timed out")),
    ]);
    let sleeper = Arc::new(RecordingSleeper::default());
    let executor = executor(Arc::clone(&transport), sleeper);
    let mut tracker = ResultTracker::new();

    let outcome = executor
        .execute(
            &SessionState::new(),
            &mut tracker,
            RequestDescriptor::get("/health").retry_budget(1),
        )
        .await;

    assert!(!outcome.matched);
    assert!(outcome.response.is_none());
    assert_eq!(transport.captured().len(), 2);
    assert_eq!(
        tracker.failure_report(),
        vec!["1. GET /health: request error: timed out".to_string()]
    );
}

#[tokio::test]
async fn status_mismatch_combines_override_with_error_field() {
    let transport = ScriptedTransport::replying(vec![Ok(ApiResponse::new(
        422,
        r#"{"error":"title is required"}"#,
    ))]);
    let executor = executor(transport, Arc::new(RecordingSleeper::default()));
    let mut tracker = ResultTracker::new();

    let outcome = executor
        .execute(
            &SessionState::new(),
            &mut tracker,
            RequestDescriptor::post("/api/sessions")
                .json(json!({}))
                .expect_any_status([200, 201])
                .error_message("create session failed"),
        )
        .await;

    assert!(!outcome.matched);
    assert_eq!(outcome.body, None);
    assert_eq!(outcome.status(), Some(422));
    assert_eq!(
        tracker.failures()[0].message,
        "create session failed: title is required"
    );
}

#[tokio::test]
async fn tolerated_mismatch_is_returned_without_recording() {
    let transport = ScriptedTransport::replying(vec![Ok(ApiResponse::new(404, ""))]);
    let executor = executor(transport, Arc::new(RecordingSleeper::default()));
    let mut tracker = ResultTracker::new();

    let outcome = executor
        .execute(
            &SessionState::new(),
            &mut tracker,
            RequestDescriptor::get("/api/auth/me").allow_failure(),
        )
        .await;

    assert!(!outcome.matched);
    assert_eq!(outcome.status(), Some(404));
    assert_eq!(tracker.total(), 0);
}

#[tokio::test]
async fn deferred_success_leaves_the_verdict_to_the_caller() {
    let transport = ScriptedTransport::replying(vec![
        Ok(ApiResponse::new(200, r#"{"user":{"id":1}}"#)),
        Ok(ApiResponse::new(500, r#"{"error":"boom"}"#)),
    ]);
    let executor = executor(transport, Arc::new(RecordingSleeper::default()));
    let mut tracker = ResultTracker::new();

    let matched = executor
        .execute(
            &SessionState::new(),
            &mut tracker,
            RequestDescriptor::post("/api/auth/login").defer_success(),
        )
        .await;
    assert!(matched.matched);
    assert_eq!(tracker.total(), 0);

    let rejected = executor
        .execute(
            &SessionState::new(),
            &mut tracker,
            RequestDescriptor::post("/api/auth/login").defer_success(),
        )
        .await;
    assert!(!rejected.matched);
    assert_eq!(
        tracker.failure_report(),
        vec!["1. POST /api/auth/login: unexpected status 500: boom".to_string()]
    );
}

#[tokio::test]
async fn empty_body_is_no_data_and_html_body_is_a_failure() {
    let transport = ScriptedTransport::replying(vec![
        Ok(ApiResponse::new(200, "")),
        Ok(ApiResponse::new(200, "<html>proxy</html>")),
    ]);
    let executor = executor(transport, Arc::new(RecordingSleeper::default()));
    let mut tracker = ResultTracker::new();
    let session = SessionState::new();

    let empty = executor
        .execute(&session, &mut tracker, RequestDescriptor::get("/health"))
        .await;
    assert!(empty.matched);
    assert_eq!(empty.body, None);

    let html = executor
        .execute(&session, &mut tracker, RequestDescriptor::get("/health"))
        .await;
    assert!(!html.matched);

    assert_eq!((tracker.success(), tracker.failure()), (1, 1));
    assert!(tracker.failures()[0].message.starts_with("invalid response body"));
}

#[tokio::test]
async fn tolerated_html_body_is_neither_matched_nor_recorded() {
    let transport = ScriptedTransport::replying(vec![Ok(ApiResponse::new(
        200,
        "<!doctype html><html>spa fallback</html>",
    ))]);
    let executor = executor(transport, Arc::new(RecordingSleeper::default()));
    let mut session = SessionState::new();
    session.establish("access", "refresh");
    let mut tracker = ResultTracker::new();

    let outcome = executor
        .execute(
            &session,
            &mut tracker,
            RequestDescriptor::get("/api/auth/me")
                .authenticated()
                .allow_failure(),
        )
        .await;

    assert!(!outcome.matched);
    assert_eq!(outcome.body, None);
    assert_eq!(outcome.status(), Some(200));
    assert!(outcome.body_error.is_some());
    assert_eq!(tracker.total(), 0);
}

#[tokio::test]
async fn headers_follow_bearer_selection_and_api_key() {
    let transport = ScriptedTransport::replying(vec![
        Ok(ApiResponse::new(200, "{}")),
        Ok(ApiResponse::new(200, "{}")),
    ]);
    let executor = RequestExecutor::new(
        transport.clone(),
        ExecutorConfig::new("http://localhost:3000/").with_api_key(ApiKeyHeader::x_api_key("k")),
    );
    let mut session = SessionState::new();
    session.establish("access-token", "refresh-token");
    let mut tracker = ResultTracker::new();

    executor
        .execute(
            &session,
            &mut tracker,
            RequestDescriptor::get("/api/auth/validate")
                .authenticated()
                .json(json!({"ignored": true})),
        )
        .await;
    executor
        .execute(
            &session,
            &mut tracker,
            RequestDescriptor::post("/api/auth/refresh")
                .bearer(BearerAuth::Refresh)
                .json(json!({"refreshToken": "refresh-token"})),
        )
        .await;

    let captured = transport.captured();
    assert_eq!(captured[0].url, "http://localhost:3000/api/auth/validate");
    assert_eq!(
        captured[0].bearer.as_ref().map(|token| token.expose()),
        Some("access-token")
    );
    assert_eq!(captured[0].body, RequestBody::Empty);
    assert_eq!(
        captured[1].bearer.as_ref().map(|token| token.expose()),
        Some("refresh-token")
    );
    assert!(matches!(captured[1].body, RequestBody::Json(_)));
    assert!(captured.iter().all(|request| request.api_key.is_some()));
}

#[tokio::test]
async fn missing_token_skips_without_network_call() {
    let transport = ScriptedTransport::replying(Vec::new());
    let executor = executor(Arc::clone(&transport), Arc::new(RecordingSleeper::default()));
    let mut tracker = ResultTracker::new();

    let outcome = executor
        .execute(
            &SessionState::new(),
            &mut tracker,
            RequestDescriptor::get("/api/sessions").authenticated(),
        )
        .await;

    assert!(outcome.skipped);
    assert!(transport.captured().is_empty());
    assert_eq!(tracker.total(), 0);
    assert_eq!(tracker.skipped().len(), 1);
}

#[tokio::test]
async fn traced_paths_log_bodies_with_shortened_token() {
    let transport = ScriptedTransport::replying(vec![Ok(ApiResponse::new(
        200,
        r#"{"valid":true,"user":{"id":"u-1"}}"#,
    ))]);
    let reporter = Arc::new(RecordingRunReporter::default());
    let executor = RequestExecutor::new(transport, ExecutorConfig::new("http://localhost:3000"))
        .with_reporter(reporter.clone());
    let mut session = SessionState::new();
    session.establish("abcdefghijklmnopqrstuvwxyz", "refresh");

    executor
        .execute(
            &session,
            &mut ResultTracker::new(),
            RequestDescriptor::get("/api/auth/validate").authenticated(),
        )
        .await;

    assert!(reporter.contains(
        ReportLevel::Debug,
        "request: GET http://localhost:3000/api/auth/validate"
    ));
    assert!(reporter.contains(ReportLevel::Debug, "Authorization: Bearer abcdefghijklmno..."));
    assert!(!reporter.contains(ReportLevel::Debug, "abcdefghijklmnopqrstuvwxyz"));
    assert!(reporter.contains(ReportLevel::Debug, "\"valid\": true"));
}

#[tokio::test]
async fn stream_collects_payloads_and_records_once() {
    let transport = ScriptedTransport::replying(Vec::new());
    *transport.stream_events.lock().expect("events lock") = vec![
        Ok(r#"{"delta":"Hel"}"#.to_string()),
        Ok(r#"{"delta":"lo"}"#.to_string()),
        Ok(r#"{"delta":"!"}"#.to_string()),
    ];
    let executor = executor(transport, Arc::new(RecordingSleeper::default()));
    let mut tracker = ResultTracker::new();

    let outcome = executor
        .execute_stream(
            &SessionState::new(),
            &mut tracker,
            RequestDescriptor::post("/api/chat/stream").json(json!({"message": "hi"})),
            StreamOptions {
                window: Duration::from_secs(5),
                max_events: Some(2),
            },
        )
        .await;

    assert!(outcome.matched);
    assert_eq!(outcome.events.len(), 2);
    assert!(!outcome.window_elapsed);
    assert_eq!((tracker.total(), tracker.success()), (1, 1));
}

#[tokio::test]
async fn stream_rejection_uses_error_body() {
    let transport = ScriptedTransport::replying(Vec::new());
    *transport.stream_status.lock().expect("status lock") = 500;
    let executor = executor(transport, Arc::new(RecordingSleeper::default()));
    let mut tracker = ResultTracker::new();

    let outcome = executor
        .execute_stream(
            &SessionState::new(),
            &mut tracker,
            RequestDescriptor::post("/api/knowledge/stream-chat"),
            StreamOptions::default(),
        )
        .await;

    assert!(!outcome.matched);
    assert_eq!(outcome.status, Some(500));
    assert_eq!(
        tracker.failures()[0].message,
        "unexpected status 500: stream closed"
    );
}

#[test]
fn default_retry_policy_allows_three_retries() {
    assert_eq!(
        ExecutorConfig::new("http://localhost:3000")
            .retry_policy
            .retry_budget(),
        3
    );
    assert_eq!(RetryPolicy::from_retry_budget(0).max_attempts, 1);
}

#[tokio::test]
async fn tolerated_stream_error_is_not_a_success() {
    let transport = ScriptedTransport::replying(Vec::new());
    *transport.stream_events.lock().expect("events lock") = vec![
        Ok(r#"{"delta":"Hel"}"#.to_string()),
        Err(TransportError::other("connection reset")),
    ];
    let executor = executor(transport, Arc::new(RecordingSleeper::default()));
    let mut tracker = ResultTracker::new();

    let outcome = executor
        .execute_stream(
            &SessionState::new(),
            &mut tracker,
            RequestDescriptor::post("/api/chat/stream").allow_failure(),
            StreamOptions::default(),
        )
        .await;

    assert!(!outcome.matched);
    assert_eq!(outcome.events.len(), 1);
    assert!(outcome.stream_error.is_some());
    assert_eq!(tracker.total(), 0);
}

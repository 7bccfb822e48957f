use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pharness::{ReportLevel, StageStatus};
use prodder::prelude::*;
use ptransport::{
    ApiEventStream, ApiRequest, ApiResponse, EventDataStream, HttpMethod, RequestBody,
    TransportFuture,
};
use serde_json::{Value, json};

const BASE_URL: &str = "http://fake.test";
const REFRESH_TOKEN: &str = "refresh-1";

#[derive(Debug, Clone, Default)]
struct Behavior {
    login_body: Option<Value>,
    refresh_returns_same_token: bool,
    logout_keeps_token: bool,
    health_connect_failures: usize,
    refresh_status: Option<u16>,
    profile_html: bool,
    create_without_id: bool,
    upload_status: Option<u16>,
    knowledge_chat_status: Option<u16>,
}

#[derive(Debug, Default)]
struct BackendState {
    calls: Vec<String>,
    access_token: String,
    revoked: Vec<String>,
    sessions: BTreeMap<String, String>,
    titles: Vec<String>,
    next_session: u32,
    health_failures_left: usize,
}

/// In-memory stand-in for the API under test.
#[derive(Debug)]
struct FakeBackend {
    behavior: Behavior,
    state: Mutex<BackendState>,
}

impl FakeBackend {
    fn new(behavior: Behavior) -> Self {
        let state = BackendState {
            access_token: "access-1".to_string(),
            health_failures_left: behavior.health_connect_failures,
            ..BackendState::default()
        };
        Self {
            behavior,
            state: Mutex::new(state),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.state.lock().expect("state lock").calls.clone()
    }

    fn titles(&self) -> Vec<String> {
        self.state.lock().expect("state lock").titles.clone()
    }

    fn respond(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut guard = self.state.lock().expect("state lock");
        let state = &mut *guard;
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        state.calls.push(format!("{} {path}", request.method));

        let bearer = request
            .bearer
            .as_ref()
            .map(|token| token.expose().to_string());
        let authorized = bearer
            .as_deref()
            .is_some_and(|token| {
                token == state.access_token && !state.revoked.iter().any(|revoked| revoked == token)
            });
        let segments = path.trim_start_matches('/').split('/').collect::<Vec<_>>();

        match (request.method, segments.as_slice()) {
            (HttpMethod::Get, ["health"]) => {
                if state.health_failures_left > 0 {
                    state.health_failures_left -= 1;
                    return Err(TransportError::connect("connection refused"));
                }
                reply(200, json!({"status": "ok"}))
            }
            (HttpMethod::Post, ["api", "auth", "login"]) => {
                let body = self.behavior.login_body.clone().unwrap_or_else(|| {
                    json!({
                        "accessToken": state.access_token,
                        "refreshToken": REFRESH_TOKEN,
                        "user": {"id": 42, "username": "tester", "email": "tester@example.com"},
                        "isNewUser": true
                    })
                });
                reply(200, body)
            }
            (HttpMethod::Post, ["api", "auth", "refresh"]) => {
                if let Some(status) = self.behavior.refresh_status {
                    return reply(status, json!({"error": "refresh store unavailable"}));
                }
                if bearer.as_deref() != Some(REFRESH_TOKEN) {
                    return reply(401, json!({"error": "invalid refresh token"}));
                }
                if !self.behavior.refresh_returns_same_token {
                    state.access_token = "access-2".to_string();
                }
                reply(200, json!({"accessToken": state.access_token}))
            }
            _ if !authorized => reply(401, json!({"error": "invalid token"})),
            (HttpMethod::Get, ["api", "auth", "validate"]) => {
                reply(200, json!({"valid": true, "user": {"id": 42}}))
            }
            (HttpMethod::Post, ["api", "auth", "logout"]) => {
                if !self.behavior.logout_keeps_token {
                    let token = state.access_token.clone();
                    state.revoked.push(token);
                }
                reply(200, json!({"success": true}))
            }
            (HttpMethod::Get, ["api", "auth", "me"]) if self.behavior.profile_html => Ok(
                ApiResponse::new(200, "<!doctype html><html>spa fallback</html>"),
            ),
            (HttpMethod::Post, ["api", "chat", "simple"]) => {
                reply(200, json!({"reply": "Hello from the fake backend"}))
            }
            (HttpMethod::Post, ["api", "chat", "stream"])
            | (HttpMethod::Post, ["api", "knowledge", "stream-chat"]) => reply(200, json!({})),
            (HttpMethod::Post, ["api", "sessions"]) => {
                let title = json_field(request, "title").unwrap_or_default();
                state.next_session += 1;
                let id = format!("s{}", state.next_session);
                state.sessions.insert(id.clone(), title.clone());
                state.titles.push(title.clone());
                if self.behavior.create_without_id {
                    return reply(201, json!({"title": title}));
                }
                reply(201, json!({"id": id, "title": title}))
            }
            (HttpMethod::Get, ["api", "sessions"]) => {
                let sessions = state
                    .sessions
                    .iter()
                    .map(|(id, title)| json!({"id": id, "title": title}))
                    .collect::<Vec<_>>();
                reply(200, Value::Array(sessions))
            }
            (HttpMethod::Get, ["api", "sessions", id]) => match state.sessions.get(*id) {
                Some(title) => reply(200, json!({"id": id, "title": title, "description": null})),
                None => reply(404, json!({"error": "session not found"})),
            },
            (HttpMethod::Put, ["api", "sessions", id]) => {
                let title = json_field(request, "title").unwrap_or_default();
                let Some(stored) = state.sessions.get_mut(*id) else {
                    return reply(404, json!({"error": "session not found"}));
                };
                stored.clone_from(&title);
                state.titles.push(title.clone());
                reply(200, json!({"id": id, "title": title}))
            }
            (HttpMethod::Delete, ["api", "sessions", id]) => match state.sessions.remove(*id) {
                Some(_) => reply(200, json!({"success": true, "deletedCount": 1})),
                None => reply(404, json!({"error": "session not found"})),
            },
            (HttpMethod::Post, ["api", "sessions", _, "messages"]) => {
                reply(201, json!({"success": true}))
            }
            (HttpMethod::Delete, ["api", "sessions", _, "messages"]) => {
                reply(200, json!({"success": true}))
            }
            (HttpMethod::Post, ["api", "knowledge", "upload"]) => match self.behavior.upload_status {
                Some(status) => reply(status, json!({"error": "upload rejected"})),
                None => reply(201, json!({"id": "doc-1"})),
            },
            (HttpMethod::Post, ["api", "knowledge", "query"]) => {
                reply(200, json!({"results": [{"content": "API features"}]}))
            }
            (HttpMethod::Post, ["api", "knowledge", "chat"]) => {
                match self.behavior.knowledge_chat_status {
                    Some(status) => reply(status, json!({"error": "no model configured"})),
                    None => reply(200, json!({"reply": "The API has sessions"})),
                }
            }
            _ => reply(404, json!({"error": "not found"})),
        }
    }
}

fn reply(status: u16, body: Value) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse::new(status, body.to_string()))
}

fn json_field(request: &ApiRequest, key: &str) -> Option<String> {
    match &request.body {
        RequestBody::Json(body) => body.get(key).and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

impl HttpTransport for FakeBackend {
    fn send<'a>(
        &'a self,
        request: ApiRequest,
    ) -> TransportFuture<'a, Result<ApiResponse, TransportError>> {
        Box::pin(async move { self.respond(&request) })
    }

    fn stream<'a>(
        &'a self,
        request: ApiRequest,
    ) -> TransportFuture<'a, Result<ApiEventStream<'a>, TransportError>> {
        Box::pin(async move {
            let response = self.respond(&request)?;
            if response.status != 200 {
                let events: EventDataStream<'a> = Box::pin(futures_util::stream::empty::<Result<String, TransportError>>());
                return Ok(ApiEventStream {
                    status: response.status,
                    error_body: Some(response.body),
                    events,
                });
            }

            let payloads: Vec<Result<String, TransportError>> =
                vec![Ok(r#"{"delta":"Hello"}"#.to_string()), Ok("[DONE]".to_string())];
            let events: EventDataStream<'a> = Box::pin(futures_util::stream::iter(payloads));
            Ok(ApiEventStream {
                status: 200,
                error_body: None,
                events,
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
        self.delays.lock().expect("delays lock").push(delay);
        Box::pin(async {})
    }
}

fn config(mode: RunMode) -> ProbeConfig {
    ProbeConfig::new(BASE_URL, Credentials::new("tester@example.com", "Test@123456"))
        .with_mode(mode)
}

fn probe(backend: &Arc<FakeBackend>, mode: RunMode) -> Probe {
    Probe::new(config(mode), backend.clone()).with_sleeper(Arc::new(RecordingSleeper::default()))
}

#[tokio::test]
async fn clean_full_run_exits_zero() {
    let backend = Arc::new(FakeBackend::new(Behavior::default()));
    let reporter = Arc::new(RecordingRunReporter::default());

    let outcome = probe(&backend, RunMode::Full)
        .with_reporter(reporter.clone())
        .run()
        .await
        .expect("config is valid");

    assert_eq!(outcome.tracker.failure_report(), Vec::<String>::new());
    assert_eq!(outcome.report.exit_code(), 0);
    assert!(outcome.report.aborted.is_none());
    assert_eq!(outcome.report.stages.len(), 10);
    assert!(
        outcome
            .tracker
            .not_implemented()
            .iter()
            .any(|note| note.label.as_str() == "GET /api/auth/me")
    );
    assert!(!outcome.session.is_authenticated());
    assert!(reporter.contains(ReportLevel::Header, "Test summary"));
}

#[tokio::test]
async fn login_without_access_token_fails_and_aborts() {
    let backend = Arc::new(FakeBackend::new(Behavior {
        login_body: Some(json!({
            "refreshToken": REFRESH_TOKEN,
            "user": {"id": 42}
        })),
        ..Behavior::default()
    }));

    let outcome = probe(&backend, RunMode::Full)
        .run()
        .await
        .expect("config is valid");

    assert_eq!(
        outcome.tracker.failure_report(),
        vec!["1. POST /api/auth/login: login response is missing accessToken".to_string()]
    );
    assert_eq!(
        outcome.report.aborted.as_ref().map(|abort| abort.stage.as_str()),
        Some("login")
    );
    assert_eq!(
        outcome.report.stage("sessions").map(|stage| stage.status.clone()),
        Some(StageStatus::NotRun)
    );
    assert_eq!(backend.calls(), vec!["GET /health", "POST /api/auth/login"]);
    assert_eq!(outcome.report.exit_code(), 1);
}

#[tokio::test]
async fn unchanged_refresh_token_is_a_warning_not_a_failure() {
    let backend = Arc::new(FakeBackend::new(Behavior {
        refresh_returns_same_token: true,
        ..Behavior::default()
    }));

    let outcome = probe(&backend, RunMode::Single(ScenarioName::Refresh))
        .run()
        .await
        .expect("config is valid");

    assert_eq!(outcome.tracker.failure(), 0);
    assert_eq!(outcome.tracker.warnings_of(WarningKind::TokenUnchanged).count(), 1);
    assert_eq!(outcome.report.exit_code(), 0);
}

#[tokio::test]
async fn token_accepted_after_logout_fails_the_run() {
    let backend = Arc::new(FakeBackend::new(Behavior {
        logout_keeps_token: true,
        ..Behavior::default()
    }));

    let outcome = probe(&backend, RunMode::Single(ScenarioName::Invalidation))
        .run()
        .await
        .expect("config is valid");

    assert_eq!(
        outcome.tracker.warnings_of(WarningKind::TokenStillValid).count(),
        1
    );
    assert!(matches!(
        outcome.report.stage("invalidation").map(|stage| &stage.status),
        Some(StageStatus::Failed(_))
    ));
    assert_eq!(outcome.report.summary.token_still_valid, 1);
    assert_eq!(outcome.report.exit_code(), 1);
}

#[tokio::test]
async fn health_check_retries_with_doubling_backoff() {
    let backend = Arc::new(FakeBackend::new(Behavior {
        health_connect_failures: 2,
        ..Behavior::default()
    }));
    let sleeper = Arc::new(RecordingSleeper::default());

    let outcome = Probe::new(config(RunMode::LoginOnly), backend.clone())
        .with_sleeper(sleeper.clone())
        .run()
        .await
        .expect("config is valid");

    assert_eq!(
        *sleeper.delays.lock().expect("delays lock"),
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert_eq!(outcome.tracker.failure(), 0);
    assert_eq!(
        backend
            .calls()
            .iter()
            .filter(|call| call.as_str() == "GET /health")
            .count(),
        3
    );
}

#[tokio::test]
async fn exhausted_retries_fail_the_health_check() {
    let backend = Arc::new(FakeBackend::new(Behavior {
        health_connect_failures: 10,
        ..Behavior::default()
    }));

    let outcome = Probe::new(config(RunMode::Full).with_retry_budget(1), backend.clone())
        .with_sleeper(Arc::new(RecordingSleeper::default()))
        .run()
        .await
        .expect("config is valid");

    assert_eq!(
        outcome.tracker.failure_report(),
        vec!["1. GET /health: request error: connection refused".to_string()]
    );
    assert_eq!(
        outcome.report.aborted.as_ref().map(|abort| abort.stage.as_str()),
        Some("health")
    );
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn session_lifecycle_deletes_twice_and_expects_not_found() {
    let backend = Arc::new(FakeBackend::new(Behavior::default()));

    let outcome = probe(&backend, RunMode::Single(ScenarioName::Sessions))
        .run()
        .await
        .expect("config is valid");

    let deletes = backend
        .calls()
        .into_iter()
        .filter(|call| call == "DELETE /api/sessions/s1")
        .count();
    assert_eq!(deletes, 2);
    assert!(
        outcome
            .tracker
            .passed()
            .iter()
            .any(|label| label.as_str() == "DELETE /api/sessions/{id} again")
    );
    assert_eq!(outcome.tracker.failure(), 0);
    assert!(outcome.session.current_session.is_none());
}

#[tokio::test]
async fn session_lifecycle_uses_configured_titles() {
    let backend = Arc::new(FakeBackend::new(Behavior::default()));
    let probe = probe(&backend, RunMode::Full);
    let runner = Runner::builder()
        .health_check(Arc::new(HealthScenario))
        .login(Arc::new(LoginScenario::new(probe.config().credentials.clone())))
        .stage(Arc::new(SessionLifecycleScenario::with_titles("T1", "T2")))
        .print_summary(false)
        .build()
        .expect("runner builds");

    let mut ctx = ScenarioContext::new(
        Arc::new(probe.executor()),
        Arc::new(RecordingRunReporter::default()),
    );
    let report = runner.run(&mut ctx).await;

    assert_eq!(backend.titles(), vec!["T1".to_string(), "T2".to_string()]);
    assert!(report.is_success());
}

#[tokio::test]
async fn login_only_mode_stops_after_login() {
    let backend = Arc::new(FakeBackend::new(Behavior::default()));

    let outcome = probe(&backend, RunMode::LoginOnly)
        .run()
        .await
        .expect("config is valid");

    assert_eq!(backend.calls(), vec!["GET /health", "POST /api/auth/login"]);
    assert_eq!(outcome.report.stages.len(), 2);
    assert!(outcome.session.is_authenticated());
    assert_eq!(outcome.session.user_id.as_deref(), Some("42"));
    assert_eq!(outcome.report.exit_code(), 0);
}

#[tokio::test]
async fn invalid_config_is_rejected_before_any_call() {
    let backend = Arc::new(FakeBackend::new(Behavior::default()));

    let result = Probe::new(
        config(RunMode::Full).with_stream_window(Duration::ZERO),
        backend.clone(),
    )
    .run()
    .await;

    assert!(result.is_err());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn login_without_refresh_token_fails_and_aborts() {
    let backend = Arc::new(FakeBackend::new(Behavior {
        login_body: Some(json!({
            "accessToken": "access-1",
            "user": {"id": 42}
        })),
        ..Behavior::default()
    }));

    let outcome = probe(&backend, RunMode::Full)
        .run()
        .await
        .expect("config is valid");

    assert_eq!(
        outcome.tracker.failure_report(),
        vec!["1. POST /api/auth/login: login response is missing refreshToken".to_string()]
    );
    assert_eq!(
        outcome.report.aborted.as_ref().map(|abort| abort.stage.as_str()),
        Some("login")
    );
    assert!(!outcome.session.is_authenticated());
    assert_eq!(outcome.report.exit_code(), 1);
}

#[tokio::test]
async fn profile_answering_html_is_a_failure() {
    let backend = Arc::new(FakeBackend::new(Behavior {
        profile_html: true,
        ..Behavior::default()
    }));

    let outcome = probe(&backend, RunMode::Single(ScenarioName::Profile))
        .run()
        .await
        .expect("config is valid");

    let failures = outcome.tracker.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].label.as_str(), "GET /api/auth/me");
    assert!(failures[0].message.starts_with("invalid response body"));
    assert!(
        !outcome
            .tracker
            .passed()
            .iter()
            .any(|label| label.as_str() == "GET /api/auth/me")
    );
    assert!(outcome.tracker.not_implemented().is_empty());
    assert!(matches!(
        outcome.report.stage("profile").map(|stage| &stage.status),
        Some(StageStatus::Failed(_))
    ));
    assert_eq!(outcome.report.exit_code(), 1);
}

#[tokio::test]
async fn failed_refresh_skips_the_follow_up_validation() {
    let backend = Arc::new(FakeBackend::new(Behavior {
        refresh_status: Some(500),
        ..Behavior::default()
    }));

    let outcome = probe(&backend, RunMode::Single(ScenarioName::Refresh))
        .run()
        .await
        .expect("config is valid");

    assert_eq!(
        outcome.tracker.failure_report(),
        vec![
            "1. POST /api/auth/refresh: token refresh failed: refresh store unavailable"
                .to_string()
        ]
    );
    let skipped = outcome
        .tracker
        .skipped()
        .iter()
        .map(|note| note.label.as_str())
        .collect::<Vec<_>>();
    assert_eq!(skipped, vec!["GET /api/auth/validate after refresh"]);
    assert_eq!(outcome.report.exit_code(), 1);
}

#[tokio::test]
async fn created_session_without_id_skips_every_dependent_step() {
    let backend = Arc::new(FakeBackend::new(Behavior {
        create_without_id: true,
        ..Behavior::default()
    }));

    let outcome = probe(&backend, RunMode::Single(ScenarioName::Sessions))
        .run()
        .await
        .expect("config is valid");

    assert_eq!(
        outcome.tracker.failure_report(),
        vec!["1. POST /api/sessions: create session response is missing id".to_string()]
    );
    let skipped = outcome.tracker.skipped();
    assert_eq!(skipped.len(), 9);
    assert!(
        skipped
            .iter()
            .all(|note| note.reason == "session was not created")
    );
    assert_eq!(
        skipped.last().map(|note| note.label.as_str()),
        Some("DELETE /api/sessions/{id} again")
    );
    assert_eq!(
        backend
            .calls()
            .iter()
            .filter(|call| call.contains("/api/sessions"))
            .count(),
        1
    );
    assert!(outcome.session.current_session.is_none());
}

#[tokio::test]
async fn rejected_uploads_name_the_auth_problem() {
    for (status, message) in [(401, "authentication failed"), (403, "permission denied")] {
        let backend = Arc::new(FakeBackend::new(Behavior {
            upload_status: Some(status),
            ..Behavior::default()
        }));

        let outcome = probe(&backend, RunMode::Single(ScenarioName::Knowledge))
            .run()
            .await
            .expect("config is valid");

        assert_eq!(
            outcome.tracker.failure_report(),
            vec![format!("1. POST /api/knowledge/upload: {message}")]
        );
        assert!(outcome.session.knowledge_file.is_none());
        assert!(
            outcome
                .tracker
                .passed()
                .iter()
                .any(|label| label.as_str() == "POST /api/knowledge/query")
        );
    }
}

#[tokio::test]
async fn failing_knowledge_chat_is_not_implemented() {
    let backend = Arc::new(FakeBackend::new(Behavior {
        knowledge_chat_status: Some(500),
        ..Behavior::default()
    }));

    let outcome = probe(&backend, RunMode::Single(ScenarioName::Knowledge))
        .run()
        .await
        .expect("config is valid");

    assert_eq!(outcome.tracker.failure(), 0);
    let not_implemented = outcome.tracker.not_implemented();
    assert_eq!(not_implemented.len(), 1);
    assert_eq!(not_implemented[0].label.as_str(), "POST /api/knowledge/chat");
    assert_eq!(not_implemented[0].reason, "endpoint returned 500");
    assert_eq!(outcome.report.exit_code(), 0);
}

//! Request Executor: one descriptor in, one recorded outcome out.
//!
//! The executor joins the base URL and path and attaches headers. It retries
//! transient transport errors with exponential backoff, then classifies the
//! response against the expected status and records the result in the
//! caller's [`ResultTracker`].

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use pcommon::preview;
use ptransport::{
    ApiKeyHeader, ApiRequest, ApiResponse, HttpTransport, NoopOperationHooks, RequestBody,
    RetryPolicy, SecretString, Sleeper, TokioSleeper, TransportError, TransportOperationHooks,
    execute_with_retry,
};
use serde_json::Value;

use crate::{
    BearerAuth, HarnessError, NoopRunReporter, RequestDescriptor, ResponseFormat, ResultTracker,
    RunReporter, SessionState,
};

/// Paths whose request and response bodies are always traced.
pub const DEFAULT_TRACED_PATHS: [&str; 3] =
    ["/api/auth/validate", "/api/sessions", "/api/knowledge/query"];

/// Characters of a non-JSON body shown in debug output.
pub const NON_JSON_PREVIEW_CHARS: usize = 200;

pub const DEFAULT_STREAM_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub api_key: Option<ApiKeyHeader>,
    pub debug: bool,
    pub traced_paths: Vec<String>,
    pub retry_policy: RetryPolicy,
}

impl ExecutorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            api_key: None,
            debug: false,
            traced_paths: DEFAULT_TRACED_PATHS.iter().map(|path| path.to_string()).collect(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, api_key: ApiKeyHeader) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(HarnessError::invalid_request(format!(
                "base url must start with http:// or https://, got '{url}'"
            )));
        }
        if self.timeout.is_zero() {
            return Err(HarnessError::invalid_request(
                "request timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Result of [`RequestExecutor::execute`].
///
/// `body` is only populated when the status matched; `response` is absent
/// when no response arrived at all. A matching status with a body that is
/// not JSON leaves `matched` false and sets `body_error`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutcome {
    pub matched: bool,
    pub body: Option<Value>,
    pub response: Option<ApiResponse>,
    pub transport_error: Option<TransportError>,
    pub body_error: Option<TransportError>,
    pub skipped: bool,
}

impl ExecutionOutcome {
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|response| response.status)
    }

    /// Body of the response as JSON, whether or not the status matched.
    pub fn any_body(&self) -> Option<Value> {
        self.body
            .clone()
            .or_else(|| self.response.as_ref()?.json().ok().flatten())
    }

    pub fn error_field(&self) -> Option<String> {
        self.response.as_ref()?.error_field()
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.body.as_ref()?.get(key)?.as_str()
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.body.as_ref()?.get(key)?.as_bool()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    pub window: Duration,
    pub max_events: Option<usize>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            window: DEFAULT_STREAM_WINDOW,
            max_events: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamOutcome {
    pub matched: bool,
    pub status: Option<u16>,
    pub events: Vec<String>,
    pub window_elapsed: bool,
    pub error_body: Option<String>,
    pub stream_error: Option<TransportError>,
}

pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    config: ExecutorConfig,
    hooks: Arc<dyn TransportOperationHooks>,
    sleeper: Arc<dyn Sleeper>,
    reporter: Arc<dyn RunReporter>,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>, config: ExecutorConfig) -> Self {
        Self {
            transport,
            config,
            hooks: Arc::new(NoopOperationHooks),
            sleeper: Arc::new(TokioSleeper),
            reporter: Arc::new(NoopRunReporter),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn TransportOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn RunReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn execute(
        &self,
        session: &SessionState,
        tracker: &mut ResultTracker,
        descriptor: RequestDescriptor,
    ) -> ExecutionOutcome {
        let label = descriptor.label();
        let request = match self.build_request(session, &descriptor) {
            Ok(request) => request,
            Err(reason) => {
                self.reporter.warn(&format!("{label} skipped: {reason}"));
                tracker.record_skipped(label, reason);
                return ExecutionOutcome {
                    skipped: true,
                    ..ExecutionOutcome::default()
                };
            }
        };

        let traced = self.is_traced(&descriptor);
        self.trace_request(&request, traced);

        let policy = self.policy_for(&descriptor);
        let result = execute_with_retry(
            &label,
            &policy,
            self.hooks.as_ref(),
            |_| self.transport.send(request.clone()),
            |delay| {
                self.reporter.warn(&format!(
                    "{label} failed to connect, retrying in {}s",
                    delay.as_secs_f64()
                ));
                self.sleeper.sleep(delay)
            },
        )
        .await;

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                tracker.record_failure(label, format!("request error: {}", error.message));
                return ExecutionOutcome {
                    transport_error: Some(error),
                    ..ExecutionOutcome::default()
                };
            }
        };

        self.reporter
            .debug(&format!("status: {}", response.status_line()));
        let parsed = match descriptor.response_format {
            ResponseFormat::Json => response.json(),
            ResponseFormat::Raw => Ok(None),
        };
        self.trace_response(&response, &parsed, traced);

        if descriptor.expected.matches(response.status) {
            return match parsed {
                Ok(body) => {
                    if !descriptor.defer_success {
                        tracker.record_success(label);
                    }
                    ExecutionOutcome {
                        matched: true,
                        body,
                        response: Some(response),
                        ..ExecutionOutcome::default()
                    }
                }
                Err(error) => {
                    if !descriptor.allow_failure {
                        tracker.record_failure(
                            label,
                            format!("invalid response body: {}", error.message),
                        );
                    }
                    ExecutionOutcome {
                        response: Some(response),
                        body_error: Some(error),
                        ..ExecutionOutcome::default()
                    }
                }
            };
        }

        if !descriptor.allow_failure {
            tracker.record_failure(label, mismatch_message(&descriptor, &response));
        }

        ExecutionOutcome {
            response: Some(response),
            ..ExecutionOutcome::default()
        }
    }

    /// Opens a server-sent-events endpoint and reads `data:` payloads until
    /// the stream ends, `max_events` arrive, or the read window elapses.
    /// Hitting the window is not an error.
    pub async fn execute_stream(
        &self,
        session: &SessionState,
        tracker: &mut ResultTracker,
        descriptor: RequestDescriptor,
        options: StreamOptions,
    ) -> StreamOutcome {
        let label = descriptor.label();
        let request = match self.build_request(session, &descriptor) {
            Ok(request) => request,
            Err(reason) => {
                self.reporter.warn(&format!("{label} skipped: {reason}"));
                tracker.record_skipped(label, reason);
                return StreamOutcome::default();
            }
        };
        self.trace_request(&request, self.is_traced(&descriptor));

        let policy = self.policy_for(&descriptor);
        let opened = execute_with_retry(
            &label,
            &policy,
            self.hooks.as_ref(),
            |_| self.transport.stream(request.clone()),
            |delay| self.sleeper.sleep(delay),
        )
        .await;

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(error) => {
                tracker.record_failure(label, format!("request error: {}", error.message));
                return StreamOutcome {
                    stream_error: Some(error),
                    ..StreamOutcome::default()
                };
            }
        };

        let mut outcome = StreamOutcome {
            status: Some(stream.status),
            error_body: stream.error_body.take(),
            ..StreamOutcome::default()
        };

        if !descriptor.expected.matches(stream.status) {
            if !descriptor.allow_failure {
                let response =
                    ApiResponse::new(stream.status, outcome.error_body.clone().unwrap_or_default());
                tracker.record_failure(label, mismatch_message(&descriptor, &response));
            }
            return outcome;
        }

        let deadline = tokio::time::Instant::now() + options.window;
        loop {
            if options
                .max_events
                .is_some_and(|max| outcome.events.len() >= max)
            {
                break;
            }
            match tokio::time::timeout_at(deadline, stream.events.next()).await {
                Err(_) => {
                    outcome.window_elapsed = true;
                    break;
                }
                Ok(None) => break,
                Ok(Some(Ok(payload))) => {
                    self.reporter.debug(&format!("event: {payload}"));
                    outcome.events.push(payload);
                }
                Ok(Some(Err(error))) => {
                    outcome.stream_error = Some(error);
                    break;
                }
            }
        }

        match &outcome.stream_error {
            Some(error) => {
                if !descriptor.allow_failure {
                    tracker.record_failure(label, format!("stream error: {}", error.message));
                }
            }
            None => {
                outcome.matched = true;
                if !descriptor.defer_success {
                    tracker.record_success(label);
                }
            }
        }

        outcome
    }

    fn build_request(
        &self,
        session: &SessionState,
        descriptor: &RequestDescriptor,
    ) -> Result<ApiRequest, String> {
        let mut request = ApiRequest::new(descriptor.method, self.endpoint(&descriptor.path))
            .with_timeout(self.config.timeout);
        request.query = descriptor.query.clone();
        request.body = if descriptor.method.carries_body() {
            descriptor.body.clone()
        } else {
            RequestBody::Empty
        };

        if let Some(api_key) = &self.config.api_key {
            request = request.with_api_key(api_key.clone());
        }
        if let Some(token) = bearer_token(session, descriptor.bearer)? {
            request = request.with_bearer(token.clone());
        }

        Ok(request)
    }

    fn policy_for(&self, descriptor: &RequestDescriptor) -> RetryPolicy {
        match descriptor.retry_budget {
            Some(retries) => RetryPolicy {
                max_attempts: retries.saturating_add(1),
                ..self.config.retry_policy.clone()
            },
            None => self.config.retry_policy.clone(),
        }
    }

    fn is_traced(&self, descriptor: &RequestDescriptor) -> bool {
        self.config.debug
            || self
                .config
                .traced_paths
                .iter()
                .any(|path| path == &descriptor.path)
    }

    fn trace_request(&self, request: &ApiRequest, traced: bool) {
        self.reporter
            .debug(&format!("request: {} {}", request.method, request.url));
        if !traced {
            return;
        }

        match &request.body {
            RequestBody::Json(body) => self.reporter.debug_json("request body", body),
            RequestBody::Multipart(form) => self.reporter.debug(&format!(
                "request body: multipart with {} field(s) and {} file(s)",
                form.fields.len(),
                form.files.len()
            )),
            RequestBody::Empty => {}
        }
        if !request.query.is_empty() {
            self.reporter
                .debug(&format!("query: {:?}", request.query));
        }
        let headers = request
            .display_headers()
            .into_iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        self.reporter.debug(&format!("headers: {headers}"));
    }

    fn trace_response(
        &self,
        response: &ApiResponse,
        parsed: &Result<Option<Value>, TransportError>,
        traced: bool,
    ) {
        match parsed {
            Ok(Some(body)) if traced => self.reporter.debug_json("response body", body),
            Ok(_) => {}
            Err(_) => self.reporter.debug(&format!(
                "non-JSON response: {}",
                preview(&response.body, NON_JSON_PREVIEW_CHARS)
            )),
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("transport", &self.transport)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn bearer_token(
    session: &SessionState,
    bearer: BearerAuth,
) -> Result<Option<&SecretString>, String> {
    let (token, name) = match bearer {
        BearerAuth::None => return Ok(None),
        BearerAuth::Access => (session.access_token.as_ref(), "access token"),
        BearerAuth::Refresh => (session.refresh_token.as_ref(), "refresh token"),
        BearerAuth::Revoked => (session.revoked_access_token.as_ref(), "logged-out token"),
    };

    match token {
        Some(token) if !token.is_empty() => Ok(Some(token)),
        _ => Err(format!("no {name} available")),
    }
}

/// Override (or the default status text) followed by the body's `error` field.
fn mismatch_message(descriptor: &RequestDescriptor, response: &ApiResponse) -> String {
    let base = descriptor
        .error_message
        .clone()
        .unwrap_or_else(|| format!("unexpected status {}", response.status));
    match response.error_field() {
        Some(detail) => format!("{base}: {detail}"),
        None => base,
    }
}

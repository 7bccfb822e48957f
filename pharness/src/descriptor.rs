//! Transient description of one endpoint call and how to judge its outcome.
//!
//! ```rust
//! use pharness::{BearerAuth, RequestDescriptor};
//! use serde_json::json;
//!
//! let create = RequestDescriptor::post("/api/sessions")
//!     .json(json!({"title": "T1"}))
//!     .authenticated()
//!     .expect_any_status([200, 201]);
//!
//! assert_eq!(create.bearer, BearerAuth::Access);
//! assert!(create.expected.matches(201));
//! assert_eq!(create.label().as_str(), "POST /api/sessions");
//! ```

use std::fmt::{Display, Formatter};

use pcommon::EndpointLabel;
use ptransport::{HttpMethod, MultipartForm, RequestBody};
use serde_json::Value;

/// Which token, if any, goes into the `Authorization` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BearerAuth {
    #[default]
    None,
    Access,
    Refresh,
    /// The access token set aside by logout.
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedStatus {
    One(u16),
    AnyOf(Vec<u16>),
}

impl ExpectedStatus {
    pub fn matches(&self, status: u16) -> bool {
        match self {
            ExpectedStatus::One(expected) => *expected == status,
            ExpectedStatus::AnyOf(expected) => expected.contains(&status),
        }
    }
}

impl Default for ExpectedStatus {
    fn default() -> Self {
        ExpectedStatus::One(200)
    }
}

impl Display for ExpectedStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectedStatus::One(status) => write!(f, "{status}"),
            ExpectedStatus::AnyOf(statuses) => {
                let joined = statuses
                    .iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join("|");
                f.write_str(&joined)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Json,
    /// Status only; the body is not parsed.
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub path: String,
    pub body: RequestBody,
    pub query: Vec<(String, String)>,
    pub bearer: BearerAuth,
    pub expected: ExpectedStatus,
    pub allow_failure: bool,
    pub error_message: Option<String>,
    pub retry_budget: Option<u32>,
    pub response_format: ResponseFormat,
    pub label: Option<EndpointLabel>,
    pub defer_success: bool,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            query: Vec::new(),
            bearer: BearerAuth::None,
            expected: ExpectedStatus::default(),
            allow_failure: false,
            error_message: None,
            retry_budget: None,
            response_format: ResponseFormat::Json,
            label: None,
            defer_success: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn bearer(mut self, bearer: BearerAuth) -> Self {
        self.bearer = bearer;
        self
    }

    pub fn authenticated(self) -> Self {
        self.bearer(BearerAuth::Access)
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expected = ExpectedStatus::One(status);
        self
    }

    pub fn expect_any_status(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.expected = ExpectedStatus::AnyOf(statuses.into_iter().collect());
        self
    }

    /// A status mismatch is returned to the caller without being recorded.
    pub fn allow_failure(mut self) -> Self {
        self.allow_failure = true;
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn retry_budget(mut self, retries: u32) -> Self {
        self.retry_budget = Some(retries);
        self
    }

    /// A matched status is left unrecorded; the caller records the verdict
    /// once it has checked the body.
    pub fn defer_success(mut self) -> Self {
        self.defer_success = true;
        self
    }

    pub fn raw_response(mut self) -> Self {
        self.response_format = ResponseFormat::Raw;
        self
    }

    pub fn with_label(mut self, label: impl Into<EndpointLabel>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Explicit label, or `"METHOD path"`.
    pub fn label(&self) -> EndpointLabel {
        self.label
            .clone()
            .unwrap_or_else(|| EndpointLabel::with_method(self.method, &self.path))
    }
}

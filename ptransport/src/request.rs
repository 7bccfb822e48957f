//! Transport-level request model: method, absolute URL, headers, and body.
//!
//! ```rust
//! use ptransport::{ApiRequest, HttpMethod, RequestBody};
//! use serde_json::json;
//!
//! let request = ApiRequest::new(HttpMethod::Post, "http://localhost:3000/api/sessions")
//!     .with_json(json!({"title": "T1"}))
//!     .with_bearer("access-token");
//!
//! assert_eq!(request.content_type(), Some("application/json"));
//! assert!(matches!(request.body, RequestBody::Json(_)));
//! ```

use std::fmt::{self, Display};
use std::time::Duration;

use serde_json::Value;

use crate::{ApiKeyHeader, SecretString};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Number of characters of a bearer token shown in debug output.
pub const BEARER_PREVIEW_CHARS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn carries_body(self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(label)
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Delete => http::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn text(
        field: impl Into<String>,
        file_name: impl Into<String>,
        contents: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime_type: "text/plain".to_string(),
            bytes: contents.into().into_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub bearer: Option<SecretString>,
    pub api_key: Option<ApiKeyHeader>,
    pub body: RequestBody,
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            bearer: None,
            api_key: None,
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_bearer(mut self, token: impl Into<SecretString>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn with_api_key(mut self, api_key: ApiKeyHeader) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Content type the transport must send. Multipart bodies return `None`
    /// so the transport can generate the boundary itself.
    pub fn content_type(&self) -> Option<&str> {
        match self.body {
            RequestBody::Multipart(_) => None,
            RequestBody::Empty | RequestBody::Json(_) => Some(JSON_CONTENT_TYPE),
        }
    }

    /// Headers as they would be sent, with secrets shortened for logging.
    pub fn display_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if let Some(content_type) = self.content_type() {
            headers.push(("Content-Type".to_string(), content_type.to_string()));
        }
        headers.extend(self.headers.iter().cloned());
        if let Some(api_key) = &self.api_key {
            headers.push((api_key.name.clone(), "[REDACTED]".to_string()));
        }
        if let Some(token) = &self.bearer {
            headers.push((
                "Authorization".to_string(),
                format!("Bearer {}", token.preview(BEARER_PREVIEW_CHARS)),
            ));
        }
        headers
    }
}

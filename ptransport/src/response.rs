//! Transport-level response model and JSON body helpers.
//!
//! ```rust
//! use ptransport::ApiResponse;
//!
//! let response = ApiResponse::new(400, r#"{"error":"title is required"}"#);
//! assert_eq!(response.error_field().as_deref(), Some("title is required"));
//!
//! let empty = ApiResponse::new(204, "  ");
//! assert_eq!(empty.json().expect("empty body is not an error"), None);
//! ```

use std::pin::Pin;
use std::time::Duration;

use futures_core::Stream;
use serde_json::Value;

use crate::TransportError;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub elapsed: Duration,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `"404 Not Found"` style rendering.
    pub fn status_line(&self) -> String {
        let reason = http::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown");
        format!("{} {reason}", self.status)
    }

    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }

    /// Parses the body as JSON. A blank body means "no data" and is `Ok(None)`.
    pub fn json(&self) -> Result<Option<Value>, TransportError> {
        if !self.has_body() {
            return Ok(None);
        }

        serde_json::from_str(&self.body)
            .map(Some)
            .map_err(|err| TransportError::decode(format!("response is not valid JSON: {err}")))
    }

    /// The `error` field of a JSON error body, if there is one.
    pub fn error_field(&self) -> Option<String> {
        let value = self.json().ok().flatten()?;
        match value.get("error")? {
            Value::String(message) => Some(message.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub type EventDataStream<'a> =
    Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send + 'a>>;

/// An opened server-sent-events response.
///
/// `events` yields the payload of every `data:` line in arrival order. When
/// the server answered with a non-success status the stream is empty and the
/// body is kept in `error_body` instead.
pub struct ApiEventStream<'a> {
    pub status: u16,
    pub error_body: Option<String>,
    pub events: EventDataStream<'a>,
}

impl std::fmt::Debug for ApiEventStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiEventStream")
            .field("status", &self.status)
            .field("error_body", &self.error_body)
            .finish_non_exhaustive()
    }
}

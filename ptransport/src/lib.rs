//! HTTP transport seam, request/response model, SSE decoding, and retry
//! policy for the prodder smoke-test harness.
//!
//! ```rust
//! use ptransport::{ApiRequest, HttpMethod, RetryPolicy, TransportError};
//! use std::time::Duration;
//!
//! let request = ApiRequest::new(HttpMethod::Get, "http://localhost:3000/health");
//! assert_eq!(request.method.to_string(), "GET");
//!
//! let policy = RetryPolicy::default();
//! assert!(policy.should_retry(1, &TransportError::connect("connection refused")));
//! assert_eq!(policy.backoff_for_attempt(2), Duration::from_secs(4));
//! ```

pub mod credentials;
pub mod error;
pub mod prelude;
pub mod request;
pub mod resilience;
pub mod response;
pub mod sse;
pub mod transport;

pub type TransportFuture<'a, T> = pcommon::BoxFuture<'a, T>;

pub use credentials::{ApiKeyHeader, SecretString};
pub use error::{TransportError, TransportErrorKind};
pub use request::{
    ApiRequest, BEARER_PREVIEW_CHARS, EVENT_STREAM_CONTENT_TYPE, FilePart, HttpMethod,
    JSON_CONTENT_TYPE, MultipartForm, RequestBody,
};
pub use resilience::{
    DEFAULT_RETRY_BUDGET, HasStatus, NoopOperationHooks, RetryPolicy, Sleeper, TokioSleeper,
    TransportOperationHooks, execute_with_retry,
};
pub use response::{ApiEventStream, ApiResponse, EventDataStream};
pub use sse::SseLineBuffer;
pub use transport::HttpTransport;

#[cfg(feature = "http-reqwest")]
pub use transport::ReqwestTransport;

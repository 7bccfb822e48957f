//! Common `ptransport` imports for downstream crates.

pub use crate::{
    ApiEventStream, ApiKeyHeader, ApiRequest, ApiResponse, HttpMethod, HttpTransport,
    MultipartForm, NoopOperationHooks, RequestBody, RetryPolicy, SecretString, Sleeper,
    TokioSleeper, TransportError, TransportErrorKind, TransportFuture, TransportOperationHooks,
    execute_with_retry,
};
pub use pcommon::{BoxFuture, EndpointLabel, ResourceId};

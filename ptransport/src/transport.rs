//! HTTP transport seam and the reqwest-backed implementation.

use crate::{ApiEventStream, ApiRequest, ApiResponse, TransportError, TransportFuture};

/// One network call per invocation; retrying is the caller's concern.
pub trait HttpTransport: Send + Sync + std::fmt::Debug {
    fn send<'a>(
        &'a self,
        request: ApiRequest,
    ) -> TransportFuture<'a, Result<ApiResponse, TransportError>>;

    fn stream<'a>(
        &'a self,
        request: ApiRequest,
    ) -> TransportFuture<'a, Result<ApiEventStream<'a>, TransportError>>;
}

#[cfg(feature = "http-reqwest")]
pub use reqwest_transport::ReqwestTransport;

#[cfg(feature = "http-reqwest")]
mod reqwest_transport {
    use std::time::{Duration, Instant};

    use async_stream::try_stream;
    use futures_util::StreamExt;
    use reqwest::header::{ACCEPT, CONTENT_TYPE};
    use reqwest::multipart::{Form, Part};
    use reqwest::{Client, RequestBuilder, Response};

    use super::HttpTransport;
    use crate::request::{EVENT_STREAM_CONTENT_TYPE, JSON_CONTENT_TYPE};
    use crate::sse::{SseLineBuffer, take_utf8_prefix};
    use crate::{
        ApiEventStream, ApiRequest, ApiResponse, EventDataStream, MultipartForm, RequestBody,
        TransportError, TransportFuture,
    };

    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new(client: Client) -> Self {
            Self { client }
        }

        /// Builds a client whose every call is bounded by `timeout`.
        pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|err| TransportError::invalid_request(err.to_string()))?;
            Ok(Self::new(client))
        }

        fn build(&self, request: ApiRequest) -> Result<RequestBuilder, TransportError> {
            let ApiRequest {
                method,
                url,
                query,
                headers,
                bearer,
                api_key,
                body,
                timeout,
            } = request;

            let mut builder = self.client.request(method.into(), url);
            if !query.is_empty() {
                builder = builder.query(&query);
            }
            for (name, value) in headers {
                builder = builder.header(name, value);
            }
            if let Some(api_key) = &api_key {
                builder = builder.header(api_key.name.as_str(), api_key.value.expose());
            }
            if let Some(token) = &bearer {
                builder = builder.bearer_auth(token.expose());
            }
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }

            builder = match body {
                RequestBody::Multipart(form) => builder.multipart(multipart_form(form)?),
                RequestBody::Json(value) if method.carries_body() => builder.json(&value),
                RequestBody::Json(_) | RequestBody::Empty => {
                    builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                }
            };

            Ok(builder)
        }
    }

    fn multipart_form(form: MultipartForm) -> Result<Form, TransportError> {
        let mut multipart = Form::new();
        for (name, value) in form.fields {
            multipart = multipart.text(name, value);
        }
        for file in form.files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime_type)
                .map_err(|err| TransportError::invalid_request(err.to_string()))?;
            multipart = multipart.part(file.field, part);
        }
        Ok(multipart)
    }

    fn collect_headers(response: &Response) -> Vec<(String, String)> {
        response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect()
    }

    impl HttpTransport for ReqwestTransport {
        fn send<'a>(
            &'a self,
            request: ApiRequest,
        ) -> TransportFuture<'a, Result<ApiResponse, TransportError>> {
            Box::pin(async move {
                let started = Instant::now();
                let response = self.build(request)?.send().await?;
                let status = response.status().as_u16();
                let headers = collect_headers(&response);
                let body = response.text().await?;

                Ok(ApiResponse {
                    status,
                    headers,
                    body,
                    elapsed: started.elapsed(),
                })
            })
        }

        fn stream<'a>(
            &'a self,
            request: ApiRequest,
        ) -> TransportFuture<'a, Result<ApiEventStream<'a>, TransportError>> {
            Box::pin(async move {
                let builder = self.build(request)?.header(ACCEPT, EVENT_STREAM_CONTENT_TYPE);
                let response = builder.send().await?;
                let status = response.status();

                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Ok(ApiEventStream {
                        status: status.as_u16(),
                        error_body: Some(body),
                        events: Box::pin(futures_util::stream::empty()) as EventDataStream<'a>,
                    });
                }

                let events = try_stream! {
                    let mut chunks = response.bytes_stream();
                    let mut pending = Vec::new();
                    let mut lines = SseLineBuffer::new();

                    while let Some(item) = chunks.next().await {
                        let bytes = item.map_err(TransportError::from)?;
                        pending.extend_from_slice(&bytes);
                        let text = take_utf8_prefix(&mut pending)?;

                        for payload in lines.push(&text) {
                            yield payload;
                        }
                        if lines.is_finished() {
                            break;
                        }
                    }

                    if let Some(payload) = lines.finish() {
                        yield payload;
                    }
                };

                Ok(ApiEventStream {
                    status: status.as_u16(),
                    error_body: None,
                    events: Box::pin(events) as EventDataStream<'a>,
                })
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::{ApiKeyHeader, FilePart, HttpMethod};

        fn transport() -> ReqwestTransport {
            ReqwestTransport::new(Client::new())
        }

        #[test]
        fn build_attaches_auth_api_key_and_query() {
            let request = ApiRequest::new(HttpMethod::Get, "http://localhost:3000/api/sessions")
                .with_query("limit", "5")
                .with_bearer("access")
                .with_api_key(ApiKeyHeader::x_api_key("test_key"));

            let built = transport()
                .build(request)
                .expect("builder")
                .build()
                .expect("request");

            assert_eq!(built.url().query(), Some("limit=5"));
            assert_eq!(
                built.headers().get("authorization").and_then(|v| v.to_str().ok()),
                Some("Bearer access")
            );
            assert_eq!(
                built.headers().get("x-api-key").and_then(|v| v.to_str().ok()),
                Some("test_key")
            );
            assert_eq!(
                built.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
                Some(JSON_CONTENT_TYPE)
            );
        }

        #[test]
        fn build_lets_multipart_choose_its_boundary() {
            let form = MultipartForm::new()
                .text("userId", "u-1")
                .file(FilePart::text("file", "doc.txt", "hello"));
            let request = ApiRequest::new(HttpMethod::Post, "http://localhost:3000/upload")
                .with_multipart(form);

            let built = transport()
                .build(request)
                .expect("builder")
                .build()
                .expect("request");
            let content_type = built
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();

            assert!(content_type.starts_with("multipart/form-data; boundary="));
        }

        #[tokio::test]
        async fn connection_refused_maps_to_transient_error() {
            let request = ApiRequest::new(HttpMethod::Get, "http://127.0.0.1:9/health");
            let error = transport()
                .send(request)
                .await
                .expect_err("nothing listens on the discard port");
            assert!(error.is_transient(), "unexpected error: {error}");
        }
    }
}

//! Gemini API relay
//!
//! Performs the outbound call for a resolved [`ForwardTarget`] and turns the
//! upstream answer into what the caller gets back: a buffered JSON payload
//! or a lazily drained byte stream.

use std::time::Duration;

use anyhow::{bail, Context};
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::StreamExt;
use serde::de::IgnoredAny;
use serde_json::Value;
use url::Url;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    proxy::{headers, RelayContext},
    resolver::{ApiVersion, Credential, ForwardTarget, Operation},
    streaming::{spawn_relay, RelayStream},
};

/// Upstream JSON payload relayed as one unit.
///
/// `body` holds the upstream bytes as received; they are checked to be JSON
/// but never re-serialized.
#[derive(Debug)]
pub struct BufferedReply {
    pub status: StatusCode,
    pub body: Bytes,
}

impl IntoResponse for BufferedReply {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(headers::DEFAULT_CONTENT_TYPE))],
            self.body,
        )
            .into_response()
    }
}

/// Upstream body relayed chunk by chunk
pub struct StreamingReply {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    pub body: RelayStream,
}

impl IntoResponse for StreamingReply {
    fn into_response(self) -> Response {
        // An error item aborts the transfer instead of ending the body cleanly.
        let body = Body::from_stream(self.body);
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = headers::stream_response_headers(self.content_type);
        response
    }
}

/// Client for the Gemini API, sharing the process-wide connection pool
#[derive(Debug, Clone)]
pub struct GeminiRelay {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
    stream_start_timeout: Duration,
    stream_buffer: usize,
}

impl GeminiRelay {
    /// Create a relay on top of a shared HTTP client
    pub fn new(client: reqwest::Client, config: &Config) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.upstream_url)
            .with_context(|| format!("Invalid upstream URL: {}", config.upstream_url))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            bail!("Upstream URL must be an http(s) base URL: {}", config.upstream_url);
        }

        Ok(Self {
            client,
            base_url,
            request_timeout: config.request_timeout,
            stream_start_timeout: config.stream_start_timeout,
            stream_buffer: config.stream_buffer,
        })
    }

    /// Resolve the upstream URL for a routed call
    pub fn target(
        &self,
        version: ApiVersion,
        operation: Operation,
        model: &str,
        credential: &Credential,
    ) -> AppResult<ForwardTarget> {
        ForwardTarget::resolve(&self.base_url, version, operation, model, credential)
    }

    /// Forward a call and return the whole upstream JSON body.
    ///
    /// Success bodies are returned verbatim with the upstream status, even
    /// when they carry application-level errors. Non-success statuses become
    /// [`AppError::UpstreamError`] with the raw body text.
    pub async fn forward_buffered(
        &self,
        ctx: &RelayContext,
        method: Method,
        target: &ForwardTarget,
        body: Option<&Value>,
    ) -> AppResult<BufferedReply> {
        ctx.log_upstream_request(target.path());

        let mut request = self
            .client
            .request(method, target.url().clone())
            .timeout(self.request_timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_failure(ctx, e, self.request_timeout))?;

        let status = response.status();
        ctx.log_upstream_response(status.as_u16());

        if !status.is_success() {
            return Err(self.upstream_error(ctx, response).await);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_failure(ctx, e, self.request_timeout))?;

        if let Err(e) = serde_json::from_slice::<IgnoredAny>(&body) {
            let message = format!("malformed upstream response: {e}");
            ctx.log_error(&message);
            return Err(AppError::relay_failure(ctx.label(), message));
        }

        Ok(BufferedReply { status, body })
    }

    /// Forward a call and relay the upstream body as it arrives.
    ///
    /// The start timeout bounds the wait for the response head only; once
    /// the upstream starts answering, the stream runs as long as it lasts.
    pub async fn forward_stream(
        &self,
        ctx: &RelayContext,
        target: &ForwardTarget,
        body: &Value,
    ) -> AppResult<StreamingReply> {
        ctx.log_upstream_request(target.path());

        let send = self.client.post(target.url().clone()).json(body).send();
        let response = match tokio::time::timeout(self.stream_start_timeout, send).await {
            Ok(result) => {
                result.map_err(|e| self.transport_failure(ctx, e, self.stream_start_timeout))?
            }
            Err(_) => {
                ctx.log_timeout(self.stream_start_timeout.as_millis());
                return Err(AppError::relay_failure(
                    ctx.label(),
                    timeout_message(self.stream_start_timeout),
                ));
            }
        };

        let status = response.status();
        ctx.log_upstream_response(status.as_u16());

        if !status.is_success() {
            return Err(self.upstream_error(ctx, response).await);
        }

        let content_type = headers::upstream_content_type(response.headers());
        ctx.log_stream_started(status.as_u16());

        // Mid-stream errors reach the caller; strip the key-bearing URL from them too.
        let upstream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(reqwest::Error::without_url));
        let body = spawn_relay(upstream, self.stream_buffer, ctx.clone());

        Ok(StreamingReply {
            status,
            content_type,
            body,
        })
    }

    /// Read an upstream error body and wrap it for the caller
    async fn upstream_error(&self, ctx: &RelayContext, response: reqwest::Response) -> AppError {
        let status = response.status();
        ctx.log_upstream_error(status.as_u16());

        // Streaming calls carry no whole-request timeout, so bound the error body read here.
        match tokio::time::timeout(self.request_timeout, response.text()).await {
            Ok(Ok(body)) => AppError::UpstreamError { status, body },
            Ok(Err(e)) => self.transport_failure(ctx, e, self.request_timeout),
            Err(_) => {
                ctx.log_timeout(self.request_timeout.as_millis());
                AppError::relay_failure(ctx.label(), timeout_message(self.request_timeout))
            }
        }
    }

    /// Map a transport-level failure to a relay failure.
    ///
    /// The URL is stripped first: it carries the caller's key.
    fn transport_failure(
        &self,
        ctx: &RelayContext,
        error: reqwest::Error,
        timeout: Duration,
    ) -> AppError {
        let error = error.without_url();

        if error.is_timeout() {
            ctx.log_timeout(timeout.as_millis());
            return AppError::relay_failure(ctx.label(), timeout_message(timeout));
        }

        let message = if error.is_decode() {
            format!("malformed upstream response: {error}")
        } else if error.is_connect() {
            format!("failed to connect to upstream: {error}")
        } else {
            format!("upstream request failed: {error}")
        };
        ctx.log_error(&message);
        AppError::relay_failure(ctx.label(), message)
    }
}

fn timeout_message(timeout: Duration) -> String {
    format!("upstream did not respond within {}s", timeout.as_secs())
}

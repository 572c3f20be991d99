//! Request logging utilities for relayed calls
//!
//! Provides structured logging with correlation IDs so a single relayed call
//! can be followed from arrival to the last streamed chunk. The caller's API
//! key is never part of the context.

use std::time::Instant;
use tracing::{debug, error, info, warn, Span};
use uuid::Uuid;

use crate::resolver::{ApiVersion, Operation};

/// Context for tracking one relayed call through the system
#[derive(Debug, Clone)]
pub struct RelayContext {
    /// Unique identifier for this request (for log correlation)
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// Caller-facing namespace the request arrived on
    pub version: ApiVersion,
    /// Operation being relayed
    pub operation: Operation,
    /// Model being addressed (absent for listModels)
    pub model: Option<String>,
}

impl RelayContext {
    /// Create a new relay context
    pub fn new(version: ApiVersion, operation: Operation) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(),
            start_time: Instant::now(),
            version,
            operation,
            model: None,
        }
    }

    /// Set the model for this request
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn streaming(&self) -> bool {
        self.operation.is_streaming()
    }

    /// Label used to tell failures apart by namespace and relay mode
    pub fn label(&self) -> String {
        let mode = if self.streaming() { "streaming" } else { "buffered" };
        format!("{}, {}", self.version, mode)
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Log request initiation
    pub fn log_request_start(&self) {
        info!(
            trace_id = %self.trace_id,
            version = %self.version,
            operation = %self.operation,
            model = ?self.model,
            streaming = %self.streaming(),
            "Relay request received"
        );
    }

    /// Log a request rejected for lack of an API key
    pub fn log_unauthenticated(&self) {
        warn!(
            trace_id = %self.trace_id,
            version = %self.version,
            operation = %self.operation,
            model = ?self.model,
            "Rejected request without API key"
        );
    }

    /// Log request being sent upstream. Only the path is logged; the query carries the key.
    pub fn log_upstream_request(&self, path: &str) {
        debug!(
            trace_id = %self.trace_id,
            operation = %self.operation,
            upstream_path = %path,
            elapsed_ms = %self.elapsed_ms(),
            "Sending request to upstream"
        );
    }

    /// Log response head received from upstream
    pub fn log_upstream_response(&self, status: u16) {
        info!(
            trace_id = %self.trace_id,
            operation = %self.operation,
            model = ?self.model,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    /// Log successful buffered completion
    pub fn log_request_complete(&self, status: u16) {
        info!(
            trace_id = %self.trace_id,
            version = %self.version,
            operation = %self.operation,
            model = ?self.model,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Relay request completed"
        );
    }

    /// Log stream started
    pub fn log_stream_started(&self, status: u16) {
        info!(
            trace_id = %self.trace_id,
            operation = %self.operation,
            model = ?self.model,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response started"
        );
    }

    /// Log stream drained to the end
    pub fn log_stream_ended(&self, chunks: usize, bytes: usize) {
        info!(
            trace_id = %self.trace_id,
            operation = %self.operation,
            model = ?self.model,
            chunks = %chunks,
            bytes = %bytes,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response ended"
        );
    }

    /// Log the caller going away mid-stream
    pub fn log_client_disconnected(&self, chunks: usize) {
        warn!(
            trace_id = %self.trace_id,
            operation = %self.operation,
            model = ?self.model,
            chunks_sent = %chunks,
            elapsed_ms = %self.elapsed_ms(),
            "Client disconnected, releasing upstream stream"
        );
    }

    /// Log an upstream non-success status
    pub fn log_upstream_error(&self, status: u16) {
        warn!(
            trace_id = %self.trace_id,
            version = %self.version,
            operation = %self.operation,
            model = ?self.model,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Upstream returned error status"
        );
    }

    /// Log request failure
    pub fn log_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            version = %self.version,
            operation = %self.operation,
            model = ?self.model,
            streaming = %self.streaming(),
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Relay request failed"
        );
    }

    /// Log timeout
    pub fn log_timeout(&self, timeout_ms: u128) {
        error!(
            trace_id = %self.trace_id,
            version = %self.version,
            operation = %self.operation,
            model = ?self.model,
            timeout_ms = %timeout_ms,
            elapsed_ms = %self.elapsed_ms(),
            "Upstream request timed out"
        );
    }

    /// Create a tracing span for this request
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "relay",
            trace_id = %self.trace_id,
            version = %self.version,
            operation = %self.operation,
            model = ?self.model,
        )
    }
}

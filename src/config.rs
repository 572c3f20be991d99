//! Configuration management for GeminiPy
//!
//! Only the listening port is read from the environment. Everything else is
//! fixed at its default, but kept on the struct so tests can point the relay
//! at a mock upstream.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Public Gemini API host. The upstream version segment is appended per call.
pub const DEFAULT_UPSTREAM_URL: &str = "https://generativelanguage.googleapis.com";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Gemini API base URL (scheme + host, optional path prefix)
    pub upstream_url: String,

    /// Whole-request timeout for buffered calls. Generation can be slow.
    pub request_timeout: Duration,
    /// Time allowed for the upstream to start answering a streaming call
    pub stream_start_timeout: Duration,
    /// Timeout for establishing upstream TCP/TLS connections
    pub connect_timeout: Duration,

    /// Idle connections kept per upstream host
    pub pool_max_idle_per_host: usize,
    /// Number of chunks buffered between the upstream reader and the client
    pub stream_buffer: usize,
    /// Largest request body accepted from callers (inline media can be large)
    pub max_request_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            stream_start_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 100,
            stream_buffer: 32,
            max_request_body_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(value) => value.parse().context("Invalid PORT")?,
            Err(_) => 8080,
        };

        Ok(Self {
            port,
            ..Self::default()
        })
    }

    /// Config pointing at a mock upstream, used by tests
    pub fn for_upstream(upstream_url: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            upstream_url: upstream_url.into(),
            ..Self::default()
        }
    }
}

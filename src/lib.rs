//! GeminiPy - reverse proxy for the Gemini API
//!
//! Forwards client calls to the Gemini API with the caller's own API key,
//! serving the `v1` and `v1beta` namespaces from the stable upstream
//! surface. Buffered calls are relayed as whole JSON documents, streaming
//! calls chunk by chunk.

pub mod config;
pub mod error;
pub mod proxy;
pub mod resolver;
pub mod routes;
pub mod streaming;

use anyhow::Result;

pub use crate::config::Config;
pub use crate::error::{AppError, AppResult};
pub use crate::proxy::GeminiRelay;

/// Service name reported by `GET /`
pub const SERVICE_NAME: &str = "geminipy";

/// Application state shared across all request handlers
///
/// Created once at startup and handed to handlers through axum state. It
/// owns the only outbound connection pool; dropping the last reference
/// closes it.
pub struct AppState {
    pub config: Config,
    /// Relay to the Gemini API, holding the shared HTTP client
    pub relay: GeminiRelay,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // No client-wide timeout: buffered and streaming calls set their own.
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let relay = GeminiRelay::new(http_client, &config)?;

        Ok(Self { config, relay })
    }
}

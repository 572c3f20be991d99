//! HTTP routes for GeminiPy
//!
//! This module defines all HTTP endpoints exposed by the proxy. Both `v1`
//! and `v1beta` are served by the same handlers; the namespace is a path
//! parameter resolved by [`crate::resolver`].

pub mod generate;
pub mod metrics;
pub mod models;
pub mod root;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{HeaderMap, Method, StatusCode},
    routing::get,
    Router,
};
use serde_json::Value;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::{
    error::AppResult,
    proxy::{BufferedReply, RelayContext},
    resolver::{resolve_credential, Credential, CredentialQuery},
    routes::metrics::record_request,
    AppState,
};

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Relayed routes; each handler checks the API key itself
    let relay_routes = Router::new()
        .route("/:version/models", get(models::list_models))
        .route(
            "/:version/models/:model",
            get(models::get_model).post(generate::model_action),
        )
        .layer(DefaultBodyLimit::max(state.config.max_request_body_bytes));

    // Public routes - no API key required
    let public_routes = Router::new()
        .route("/", get(root::service_status))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(relay_routes)
        // Global middleware (applied to all routes).
        // Spans record the path only: the query string may carry `api_key`.
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        }))
        .layer(cors)
        .with_state(state)
}

/// Resolve the caller's API key, logging rejections without the key itself
pub(crate) fn authenticate(
    ctx: &RelayContext,
    headers: &HeaderMap,
    query: &CredentialQuery,
) -> AppResult<Credential> {
    resolve_credential(headers, query).inspect_err(|_| ctx.log_unauthenticated())
}

/// Run a buffered relay call and record its outcome
pub(crate) async fn relay_buffered(
    state: &AppState,
    ctx: &RelayContext,
    method: Method,
    credential: &Credential,
    body: Option<&Value>,
) -> AppResult<BufferedReply> {
    let model = ctx.model.as_deref().unwrap_or_default();
    let target = state
        .relay
        .target(ctx.version, ctx.operation, model, credential)?;

    let result = state
        .relay
        .forward_buffered(ctx, method, &target, body)
        .instrument(ctx.create_span())
        .await;

    let status = match &result {
        Ok(reply) => {
            ctx.log_request_complete(reply.status.as_u16());
            reply.status
        }
        Err(e) => e.status(),
    };
    record_outcome(ctx, status);

    result
}

/// Record request metrics for a finished (or stream-started) relay call
pub(crate) fn record_outcome(ctx: &RelayContext, status: StatusCode) {
    let duration = ctx.start_time.elapsed().as_secs_f64();
    record_request(
        ctx.operation.as_str(),
        ctx.version.as_str(),
        status.as_u16(),
        duration,
    );
}

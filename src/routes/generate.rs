//! Content generation endpoints
//!
//! `POST /{version}/models/{model}:generateContent` is relayed buffered,
//! `POST /{version}/models/{model}:streamGenerateContent` chunk by chunk.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::Instrument;

use crate::{
    error::{AppError, AppResult},
    proxy::RelayContext,
    resolver::{ApiVersion, Credential, CredentialQuery, Operation},
    routes::{authenticate, record_outcome, relay_buffered},
    AppState,
};

/// Handle `POST /{version}/models/{model}:{action}`
///
/// The `{model}:{action}` pair arrives as one path segment and is split on
/// the last colon.
pub async fn model_action(
    State(state): State<Arc<AppState>>,
    Path((version, model_action)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let version = ApiVersion::from_path(&version)?;
    let (model, action) = model_action.rsplit_once(':').ok_or(AppError::NotFound)?;
    let operation = Operation::from_action(action)?;

    let ctx = RelayContext::new(version, operation).with_model(model);
    let query = CredentialQuery::from_raw(query.as_deref());
    let credential = authenticate(&ctx, &headers, &query)?;
    ctx.log_request_start();

    let request_body = parse_body(&ctx, &body).inspect_err(|e| record_outcome(&ctx, e.status()))?;

    if operation.is_streaming() {
        stream_generate_content(&state, &ctx, &credential, &request_body).await
    } else {
        relay_buffered(&state, &ctx, Method::POST, &credential, Some(&request_body))
            .await
            .map(IntoResponse::into_response)
    }
}

async fn stream_generate_content(
    state: &AppState,
    ctx: &RelayContext,
    credential: &Credential,
    body: &Value,
) -> AppResult<Response> {
    let model = ctx.model.as_deref().unwrap_or_default();
    let target = state
        .relay
        .target(ctx.version, ctx.operation, model, credential)?;

    let result = state
        .relay
        .forward_stream(ctx, &target, body)
        .instrument(ctx.create_span())
        .await;

    match result {
        Ok(reply) => {
            record_outcome(ctx, reply.status);
            Ok(reply.into_response())
        }
        Err(e) => {
            record_outcome(ctx, e.status());
            Err(e)
        }
    }
}

/// Parse the caller's JSON body. It is forwarded as-is, never validated.
fn parse_body(ctx: &RelayContext, body: &[u8]) -> AppResult<Value> {
    serde_json::from_slice(body).map_err(|e| {
        let message = format!("invalid JSON request body: {e}");
        ctx.log_error(&message);
        AppError::relay_failure(ctx.label(), message)
    })
}

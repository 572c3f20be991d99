//! Models endpoints
//!
//! Lists models and fetches single-model info from the upstream.

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
};

use crate::{
    error::AppResult,
    proxy::{BufferedReply, RelayContext},
    resolver::{ApiVersion, CredentialQuery, Operation},
    routes::{authenticate, relay_buffered},
    AppState,
};

/// `GET /{version}/models`
pub async fn list_models(
    State(state): State<Arc<AppState>>,
    Path(version): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> AppResult<BufferedReply> {
    let version = ApiVersion::from_path(&version)?;
    let ctx = RelayContext::new(version, Operation::ListModels);
    let query = CredentialQuery::from_raw(query.as_deref());
    let credential = authenticate(&ctx, &headers, &query)?;

    ctx.log_request_start();
    relay_buffered(&state, &ctx, Method::GET, &credential, None).await
}

/// `GET /{version}/models/{model}`
pub async fn get_model(
    State(state): State<Arc<AppState>>,
    Path((version, model)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> AppResult<BufferedReply> {
    let version = ApiVersion::from_path(&version)?;
    let ctx = RelayContext::new(version, Operation::GetModel).with_model(model);
    let query = CredentialQuery::from_raw(query.as_deref());
    let credential = authenticate(&ctx, &headers, &query)?;

    ctx.log_request_start();
    relay_buffered(&state, &ctx, Method::GET, &credential, None).await
}

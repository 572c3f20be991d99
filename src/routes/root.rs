//! Service status endpoint

use axum::Json;
use serde::Serialize;

use crate::SERVICE_NAME;

/// Body of `GET /`
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
    pub service: &'static str,
}

/// Report that the service is up. Needs no credential and never calls upstream.
pub async fn service_status() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "running",
        service: SERVICE_NAME,
    })
}

//! Health check endpoint.

use axum::Json;
use axum::extract::State;

use crate::api::types::{ApiContext, HealthResponse};

/// `GET /api/health`: dataset load status and size, always 200.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse::from_store(&ctx.store))
}

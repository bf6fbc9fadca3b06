//! API router.
//!
//! Returns a composable `Router` with every route under `/api/`. A permissive
//! CORS layer lets the browser front-end call it from another origin.

use axum::Router;
use axum::http::Uri;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;

pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/health", get(endpoints::health::check))
        .route(
            "/api/drugs/search",
            get(endpoints::drugs::search_query).post(endpoints::drugs::search_body),
        )
        .route("/api/drugs/stats", get(endpoints::drugs::stats))
        .route("/api/drugs/reload", post(endpoints::drugs::reload))
        .route("/api/recommend", post(endpoints::recommend::recommend))
        .fallback(not_found)
        .with_state(ctx)
        .layer(CorsLayer::permissive())
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

//! Drug dataset endpoints.
//!
//! - `GET /api/drugs/search`: filters from the query string
//! - `POST /api/drugs/search`: filters from a JSON body (query string merged underneath)
//! - `GET /api/drugs/stats`: categorical distributions
//! - `POST /api/drugs/reload`: re-read the source file

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::params::RequestParams;
use crate::api::types::{ApiContext, HealthResponse, SearchResponse, search_envelope};
use crate::entities::stats::{StatsOutcome, compute_stats};

type PairQuery = Result<Query<Vec<(String, String)>>, QueryRejection>;

fn query_params(query: PairQuery) -> RequestParams {
    match query {
        Ok(Query(pairs)) => RequestParams::from_pairs(pairs),
        Err(rejection) => {
            debug!(%rejection, "Ignoring malformed query string");
            RequestParams::default()
        }
    }
}

async fn run_search(ctx: &ApiContext, params: RequestParams) -> (StatusCode, Json<SearchResponse>) {
    let snapshot = ctx.store.ensure_loaded().await;
    let response = search_envelope(&snapshot, params.search_filters(), params.limit());
    let status = if snapshot.is_loaded() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// `GET /api/drugs/search`
pub async fn search_query(
    State(ctx): State<ApiContext>,
    query: PairQuery,
) -> (StatusCode, Json<SearchResponse>) {
    run_search(&ctx, query_params(query)).await
}

/// `POST /api/drugs/search`
pub async fn search_body(
    State(ctx): State<ApiContext>,
    query: PairQuery,
    body: Bytes,
) -> (StatusCode, Json<SearchResponse>) {
    let params = query_params(query).merged(RequestParams::from_json_body(&body));
    run_search(&ctx, params).await
}

/// `GET /api/drugs/stats`
pub async fn stats(State(ctx): State<ApiContext>) -> (StatusCode, Json<StatsOutcome>) {
    let snapshot = ctx.store.ensure_loaded().await;
    let outcome = compute_stats(&snapshot, ctx.stats_sample_size);
    let status = if outcome.is_loaded() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(outcome))
}

/// `POST /api/drugs/reload`
pub async fn reload(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    ctx.store.reload().await?;
    Ok(Json(HealthResponse::from_store(&ctx.store)))
}

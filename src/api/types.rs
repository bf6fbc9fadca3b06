//! Shared state and response envelopes for the API layer.

use std::sync::Arc;

use serde::Serialize;

use crate::api::params::QueryEcho;
use crate::dataset::{DatasetSnapshot, DatasetStatus, DatasetStore};
use crate::entities::drug::{DrugSearchFilters, search_page};
use crate::entities::recommend::Medication;
use crate::transform::drug::{DrugSearchResult, to_search_results};

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<DatasetStore>,
    pub stats_sample_size: usize,
}

impl ApiContext {
    pub fn new(store: Arc<DatasetStore>, stats_sample_size: usize) -> Self {
        Self {
            store,
            stats_sample_size,
        }
    }
}

/// Client-facing availability label for the dataset.
pub fn database_status(status: DatasetStatus) -> &'static str {
    match status {
        DatasetStatus::Loaded => "loaded",
        DatasetStatus::Idle | DatasetStatus::Loading => "loading",
        DatasetStatus::Failed => "unavailable",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<DrugSearchResult>,
    pub total: usize,
    pub showing: usize,
    pub query: QueryEcho,
    pub database_status: &'static str,
    pub total_drugs: usize,
}

/// Runs a search and shapes the response envelope.
///
/// An unloaded snapshot produces an empty envelope whose `database_status`
/// is not `"loaded"`.
pub fn search_envelope(
    snapshot: &DatasetSnapshot,
    filters: DrugSearchFilters,
    limit: usize,
) -> SearchResponse {
    let page = search_page(snapshot, &filters, limit);
    let showing = page.showing();
    SearchResponse {
        results: to_search_results(page.results),
        total: page.total,
        showing,
        query: QueryEcho { filters, limit },
        database_status: database_status(snapshot.status()),
        total_drugs: snapshot.total(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database_status: &'static str,
    pub total_drugs: usize,
    pub dataset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn from_store(store: &DatasetStore) -> Self {
        let snapshot = store.snapshot();
        Self {
            status: if snapshot.is_loaded() { "ok" } else { "degraded" },
            database_status: database_status(snapshot.status()),
            total_drugs: snapshot.total(),
            dataset: store.path().display().to_string(),
            error: snapshot.last_error().map(str::to_string),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Body returned by the recommendation route when it cannot answer.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendFailure {
    pub error: String,
    pub medications: Vec<Medication>,
    pub disclaimer: &'static str,
}

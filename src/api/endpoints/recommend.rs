//! Symptom-based recommendation endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::params::{additional_info_from_json, symptoms_from_json};
use crate::api::types::{ApiContext, RecommendFailure};
use crate::entities::recommend::{DEFAULT_TOP_K, recommend as rank};
use crate::error::MedDbError;

const MISSING_SYMPTOMS_DISCLAIMER: &str = "Please provide a list of symptoms.";
const UNAVAILABLE_DISCLAIMER: &str = "The Medicine Recommendation service is currently unavailable. \
Please consult a healthcare professional.";

fn failure(status: StatusCode, error: String, disclaimer: &'static str) -> Response {
    let body = RecommendFailure {
        error,
        medications: Vec::new(),
        disclaimer,
    };
    (status, Json(body)).into_response()
}

/// `POST /api/recommend`: `{"symptoms": [...] | "a, b", "additional_info": "..."}`
pub async fn recommend(State(ctx): State<ApiContext>, body: Bytes) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let symptoms = symptoms_from_json(&body);
    let additional_info = additional_info_from_json(&body);

    let snapshot = ctx.store.ensure_loaded().await;
    match rank(&snapshot, &symptoms, additional_info.as_deref(), DEFAULT_TOP_K) {
        Ok(recommendation) => Json(recommendation).into_response(),
        Err(MedDbError::InvalidArgument(msg)) => {
            failure(StatusCode::BAD_REQUEST, msg, MISSING_SYMPTOMS_DISCLAIMER)
        }
        Err(err @ MedDbError::NotLoaded { .. }) => failure(
            StatusCode::SERVICE_UNAVAILABLE,
            err.to_string(),
            UNAVAILABLE_DISCLAIMER,
        ),
        Err(err) => ApiError::from(err).into_response(),
    }
}

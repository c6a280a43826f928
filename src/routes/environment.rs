//! `GET /api/environment/{lat}/{lon}`: the full environment report.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::AppState;
use crate::models::Coordinates;

// ---

#[derive(Debug, Deserialize)]
struct EnvironmentQuery {
    city: Option<String>,
}

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/environment/{lat}/{lon}", get(handler))
}

async fn handler(
    Path((lat, lon)): Path<(String, String)>,
    Query(params): Query<EnvironmentQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /api/environment/{}/{}", lat, lon);

    let at = match Coordinates::parse(&lat, &lon) {
        Ok(at) => at,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid coordinates: {}", e) })),
            )
                .into_response();
        }
    };

    match state.service.report(at, params.city.as_deref()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!("Environment report failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("Environment data error: {:#}", e) })),
            )
                .into_response()
        }
    }
}

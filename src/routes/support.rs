//! `GET /api/support`: emergency phone numbers for a location.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::AppState;

// ---

#[derive(Debug, Deserialize)]
struct SupportQuery {
    #[serde(default)]
    city: String,
    /// ISO 3166-1 alpha-2 code.
    #[serde(default)]
    country: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/support", get(handler))
}

async fn handler(
    Query(params): Query<SupportQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    let contacts = state.service.support(&params.city, &params.country).await;
    (StatusCode::OK, Json(contacts)).into_response()
}

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::AppState;

// ---

#[derive(Debug, Deserialize)]
struct GeocodeQuery {
    city: Option<String>,
    country: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/geocode", get(handler))
}

async fn handler(
    Query(params): Query<GeocodeQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    let Some(city) = params.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "City is required" })),
        )
            .into_response();
    };

    let locations = state.service.geocode(city, params.country.as_deref()).await;
    debug!("GET /api/geocode - {} matches for '{}'", locations.len(), city);
    (StatusCode::OK, Json(locations)).into_response()
}

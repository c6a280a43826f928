//! `POST /api/advisory`: advice and a daily plan for a caller-supplied snapshot.
//!
//! Lets a client re-run the advisory step (for example with a `fire_count`)
//! without refetching weather and air quality.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use tracing::info;

use super::AppState;
use crate::models::EnvironmentSnapshot;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/api/advisory", post(handler))
}

async fn handler(
    State(state): State<AppState>,
    Json(snapshot): Json<EnvironmentSnapshot>,
) -> impl IntoResponse {
    // ---
    info!("POST /api/advisory - AQI {}", snapshot.aqi);

    let advisory = state.service.advise(&snapshot).await;
    (StatusCode::OK, Json(advisory)).into_response()
}

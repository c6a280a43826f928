// src/routes/health.rs
//! Liveness endpoint for the advisory service.
//!
//! Container orchestrators and uptime checks poll `/health` to confirm the
//! process is serving HTTP. It follows the Explicit Module Boundary Pattern
//! (EMBP) like its siblings:
//! - Internal to this file: the handler and its response type
//! - Exports to the gateway (`mod.rs`): a subrouter containing `/health`

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
///
/// Does not call any upstream provider, so it stays green while
/// OpenWeatherMap or the advisory oracle are unreachable.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the state type so it merges into the gateway router whatever
/// state the other endpoints share.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}

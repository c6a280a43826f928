use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::AppState;

// ---

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
struct NewsQuery {
    limit: Option<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/news/{city}", get(handler))
}

async fn handler(
    Path(city): Path<String>,
    Query(params): Query<NewsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let items = state.service.news(&city, limit).await;
    (StatusCode::OK, Json(items)).into_response()
}

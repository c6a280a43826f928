//! HTTP gateway (EMBP).
//!
//! Each sibling module owns one endpoint group and exports a subrouter; this
//! gateway merges them, attaches the shared [`AppState`], and wraps the whole
//! API in request tracing and permissive CORS. `main.rs` only sees [`router`].

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::EnvironmentService;

mod advisory;
mod environment;
mod geocode;
mod health;
mod news;
mod support;

// ---

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EnvironmentService>,
}

pub fn router(service: Arc<EnvironmentService>) -> Router {
    // ---
    Router::new()
        .merge(environment::router())
        .merge(advisory::router())
        .merge(geocode::router())
        .merge(news::router())
        .merge(support::router())
        .merge(health::router())
        .with_state(AppState { service })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

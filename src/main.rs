//! Application entry point for the `airsense-advisor` service.
//!
//! This binary orchestrates the startup sequence for the air-quality advisory
//! API:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the upstream provider clients and the response cache
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `OPENWEATHER_API_KEY` (**required**) – OpenWeatherMap key
//! - `AQI_API_KEY` (optional) – WAQI station feed token
//! - `RELEVANCE_PROJECT` / `RELEVANCE_API_KEY` (optional) – advisory oracle
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config` for the full list. This module follows the Explicit Module
//! Boundary Pattern (EMBP) by delegating configuration parsing to `config`,
//! orchestration to `service`, and route registration to `routes`.
use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

mod aqi;
mod cache;
mod config;
mod models;
mod planner;
mod providers;
mod routes;
mod service;

pub use config::Config;

// Re-exported so routes/*.rs reach the service through their parent module
// rather than knowing where it lives.
pub use service::EnvironmentService;

use cache::{MokaCache, NoCache, ResponseCache};
use providers::{GoogleNewsClient, OpenWeatherClient, RelevanceOracle, WaqiClient};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let service = build_service(&cfg)?;

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(Arc::new(service));

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.bind_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wire the configured providers into an [`EnvironmentService`].
///
/// The WAQI station feed is consulted before OpenWeatherMap when a token is
/// set; the oracle is attached only when both Relevance credentials are.
fn build_service(cfg: &Config) -> Result<EnvironmentService> {
    // ---
    let http = providers::build_http_client()?;
    let openweather = Arc::new(OpenWeatherClient::new(
        http.clone(),
        &cfg.openweather_base_url,
        &cfg.openweather_api_key,
    ));
    let cache: Arc<dyn ResponseCache> = if cfg.cache_ttl_secs == 0 {
        tracing::info!("Response cache disabled (CACHE_TTL_SECS=0)");
        Arc::new(NoCache)
    } else {
        Arc::new(MokaCache::new(
            Duration::from_secs(cfg.cache_ttl_secs),
            cfg.cache_max_entries,
        ))
    };
    let planner = planner::Planner::new(cfg.plan_policy);
    tracing::debug!("Daily plans use the {:?} tiering policy", planner.policy());

    let mut service = EnvironmentService::new(openweather.clone(), cache);

    if let Some(token) = &cfg.waqi_token {
        service = service.with_air_quality(Arc::new(WaqiClient::new(
            http.clone(),
            &cfg.waqi_base_url,
            token,
            cfg.station_max_distance_km,
        )));
    }

    service = service
        .with_air_quality(openweather.clone())
        .with_outlook(openweather)
        .with_news(
            Arc::new(GoogleNewsClient::new(http.clone(), &cfg.news_base_url)),
            cfg.news_limit,
        )
        .with_planner(planner);

    if let Some(relevance) = &cfg.relevance {
        service = service.with_oracle(Arc::new(RelevanceOracle::new(http, relevance.clone())));
    }

    Ok(service)
}

// ---

/// Install the global `tracing` subscriber.
///
/// Output is compact with target, file and line. Provider calls log at
/// `debug`, degraded fallbacks at `warn`, and each environment report runs
/// inside an `environment_report` span tagged with its request id, so
/// `AXUM_SPAN_EVENTS=full` shows per-report timings. `FORCE_COLOR`
/// overrides TTY detection for ANSI colour.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(log_filter())
        .with_ansi(use_color())
        .compact()
        .init();
}

fn use_color() -> bool {
    match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    }
}

/// `RUST_LOG` wins; otherwise `AXUM_LOG_LEVEL` (default `debug`) for this
/// crate, with the HTTP client stack held at `info`.
fn log_filter() -> EnvFilter {
    // ---
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    EnvFilter::new(filter_directives(env::var("AXUM_LOG_LEVEL").ok().as_deref()))
}

fn filter_directives(level: Option<&str>) -> String {
    // ---
    let level = match level {
        Some(level @ ("trace" | "debug" | "info" | "warn" | "error")) => level,
        _ => "debug",
    };
    format!("{level},hyper_util=info,reqwest=info")
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_filter_directives() {
        // ---
        assert_eq!(filter_directives(Some("warn")), "warn,hyper_util=info,reqwest=info");
        assert_eq!(filter_directives(Some("loud")), "debug,hyper_util=info,reqwest=info");
        assert_eq!(filter_directives(None), "debug,hyper_util=info,reqwest=info");
    }
}

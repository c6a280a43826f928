//! Configuration loader for the `airsense-advisor` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;

use anyhow::{anyhow, Result};

use crate::planner::TieringPolicy;

/// Parse an optional environment variable into `$ty` with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Read an optional, non-empty string environment variable.
fn optional_env(var_name: &str) -> Option<String> {
    env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_WAQI_BASE_URL: &str = "https://api.waqi.info";
pub const DEFAULT_NEWS_BASE_URL: &str = "https://news.google.com";
pub const DEFAULT_RELEVANCE_REGION: &str = "d7b62b";
pub const DEFAULT_RELEVANCE_TOOL_ID: &str = "92f0d1e5-c44d-41c5-a05a-ae75c58941a2";

/// Credentials for the hosted advisory oracle.
#[derive(Debug, Clone)]
pub struct RelevanceConfig {
    pub project: String,
    pub api_key: String,
    pub region: String,
    pub tool_id: String,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// OpenWeatherMap API key (geocoding, weather, pollution).
    pub openweather_api_key: String,

    /// OpenWeatherMap base URL.
    pub openweather_base_url: String,

    /// WAQI station feed token; the station provider is skipped when unset.
    pub waqi_token: Option<String>,

    /// WAQI base URL.
    pub waqi_base_url: String,

    /// Advisory oracle credentials; the rule-based plan is used alone when unset.
    pub relevance: Option<RelevanceConfig>,

    /// News RSS base URL.
    pub news_base_url: String,

    /// Port the HTTP server binds to.
    pub bind_port: u16,

    /// Seconds an environment report stays cached.
    pub cache_ttl_secs: u64,

    /// Maximum number of cached reports.
    pub cache_max_entries: u64,

    /// Stations farther than this from the query point are ignored.
    pub station_max_distance_km: f64,

    /// Headlines attached to an environment report.
    pub news_limit: usize,

    /// Threshold variant used for hydration and narrative selection.
    pub plan_policy: TieringPolicy,
}

fn parse_policy(raw: Option<String>) -> Result<TieringPolicy> {
    // ---
    match raw.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("standard") => Ok(TieringPolicy::Standard),
        Some("extended") => Ok(TieringPolicy::Extended),
        Some(other) => Err(anyhow!(
            "Invalid PLAN_POLICY: '{}' (expected 'standard' or 'extended')",
            other
        )),
    }
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `OPENWEATHER_API_KEY` – OpenWeatherMap key
///
/// Optional:
/// - `AQI_API_KEY` – WAQI token
/// - `RELEVANCE_PROJECT`, `RELEVANCE_API_KEY` – advisory oracle (both needed)
/// - `RELEVANCE_REGION` (default `d7b62b`), `RELEVANCE_TOOL_ID`
/// - `OPENWEATHER_BASE_URL`, `WAQI_BASE_URL`, `NEWS_BASE_URL`
/// - `BIND_PORT` (default 8080)
/// - `CACHE_TTL_SECS` (default 600, `0` disables caching), `CACHE_MAX_ENTRIES` (default 1000)
/// - `STATION_MAX_DISTANCE_KM` (default 25)
/// - `NEWS_LIMIT` (default 5)
/// - `PLAN_POLICY` – `standard` (default) or `extended`
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let openweather_api_key = require_env!("OPENWEATHER_API_KEY");

    let relevance = match (optional_env("RELEVANCE_PROJECT"), optional_env("RELEVANCE_API_KEY")) {
        (Some(project), Some(api_key)) => Some(RelevanceConfig {
            project,
            api_key,
            region: optional_env("RELEVANCE_REGION").unwrap_or_else(|| DEFAULT_RELEVANCE_REGION.into()),
            tool_id: optional_env("RELEVANCE_TOOL_ID").unwrap_or_else(|| DEFAULT_RELEVANCE_TOOL_ID.into()),
        }),
        _ => None,
    };

    let station_max_distance_km = parse_env!("STATION_MAX_DISTANCE_KM", f64, 25.0);
    if !(station_max_distance_km.is_finite() && station_max_distance_km > 0.0) {
        return Err(anyhow!(
            "Invalid STATION_MAX_DISTANCE_KM: {} (must be positive)",
            station_max_distance_km
        ));
    }

    Ok(Config {
        openweather_api_key,
        openweather_base_url: optional_env("OPENWEATHER_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENWEATHER_BASE_URL.into()),
        waqi_token: optional_env("AQI_API_KEY"),
        waqi_base_url: optional_env("WAQI_BASE_URL").unwrap_or_else(|| DEFAULT_WAQI_BASE_URL.into()),
        relevance,
        news_base_url: optional_env("NEWS_BASE_URL").unwrap_or_else(|| DEFAULT_NEWS_BASE_URL.into()),
        bind_port: parse_env!("BIND_PORT", u16, 8080),
        cache_ttl_secs: parse_env!("CACHE_TTL_SECS", u64, 600),
        cache_max_entries: parse_env!("CACHE_MAX_ENTRIES", u64, 1000),
        station_max_distance_km,
        news_limit: parse_env!("NEWS_LIMIT", usize, 5),
        plan_policy: parse_policy(optional_env("PLAN_POLICY"))?,
    })
}

/// Show only the first four characters of a secret.
fn mask_secret(secret: &str) -> String {
    // ---
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks API keys while showing all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        let waqi = self
            .waqi_token
            .as_deref()
            .map(mask_secret)
            .unwrap_or_else(|| "(unset, station feed disabled)".to_string());
        let oracle = self
            .relevance
            .as_ref()
            .map(|r| format!("project {} region {} key {}", r.project, r.region, mask_secret(&r.api_key)))
            .unwrap_or_else(|| "(unset, rule-based plan only)".to_string());

        tracing::info!("Configuration loaded:");
        tracing::info!("  OPENWEATHER_API_KEY     : {}", mask_secret(&self.openweather_api_key));
        tracing::info!("  OPENWEATHER_BASE_URL    : {}", self.openweather_base_url);
        tracing::info!("  AQI_API_KEY             : {}", waqi);
        tracing::info!("  WAQI_BASE_URL           : {}", self.waqi_base_url);
        tracing::info!("  RELEVANCE               : {}", oracle);
        tracing::info!("  NEWS_BASE_URL           : {}", self.news_base_url);
        tracing::info!("  BIND_PORT               : {}", self.bind_port);
        tracing::info!("  CACHE_TTL_SECS          : {}", self.cache_ttl_secs);
        tracing::info!("  CACHE_MAX_ENTRIES       : {}", self.cache_max_entries);
        tracing::info!("  STATION_MAX_DISTANCE_KM : {}", self.station_max_distance_km);
        tracing::info!("  NEWS_LIMIT              : {}", self.news_limit);
        tracing::info!("  PLAN_POLICY             : {:?}", self.plan_policy);
    }
}

//! External collaborators (EMBP gateway).
//!
//! Each upstream service sits behind an async trait so that `service` can be
//! exercised with in-memory fakes. Implementations return `anyhow::Result`
//! and never decide on fallbacks themselves; the service does that at the
//! call site.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::models::{
    AirQuality, Coordinates, CurrentWeather, EmergencyContacts, EnvironmentSnapshot,
    ForecastDay, GeoLocation, HealthAnalysis, NewsItem,
};

pub mod emergency;
mod news;
mod openweather;
mod relevance;
mod waqi;

pub use news::GoogleNewsClient;
pub use openweather::OpenWeatherClient;
pub use relevance::RelevanceOracle;
pub use waqi::WaqiClient;

// ---

/// User agent sent with every outbound request.
pub const USER_AGENT: &str = concat!("airsense-advisor/", env!("CARGO_PKG_VERSION"));

/// Geocoding and current weather.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn geocode(&self, city: &str, country: Option<&str>) -> Result<Vec<GeoLocation>>;
    async fn current_weather(&self, at: Coordinates) -> Result<CurrentWeather>;
}

/// A source of current pollutant concentrations.
#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the provider answered but has no usable data for this point.
    async fn current_air_quality(&self, at: Coordinates) -> Result<Option<AirQuality>>;
}

/// Daily-max AQI forecast and history.
#[async_trait]
pub trait OutlookProvider: Send + Sync {
    async fn forecast(&self, at: Coordinates) -> Result<Vec<ForecastDay>>;
    async fn history(&self, at: Coordinates, now: DateTime<Utc>) -> Result<Vec<ForecastDay>>;
}

/// Hosted language-model advisory service.
#[async_trait]
pub trait AdvisoryOracle: Send + Sync {
    async fn assess(&self, env: &EnvironmentSnapshot) -> Result<HealthAnalysis>;
    async fn emergency_contacts(&self, city: &str, country: &str) -> Result<EmergencyContacts>;
}

/// Pollution headlines for a city.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn headlines(&self, city: &str, limit: usize) -> Result<Vec<NewsItem>>;
}

/// Send a request and deserialize a JSON body, failing on non-2xx status.
///
/// Query strings carry API keys, so the URL is stripped from every error.
async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    // ---
    let response = request.send().await.map_err(reqwest::Error::without_url)?;

    if !response.status().is_success() {
        bail!("Request failed with status: {}", response.status());
    }

    let data = response
        .json::<T>()
        .await
        .map_err(reqwest::Error::without_url)?;
    Ok(data)
}

/// Shared reqwest client with the service user agent.
pub fn build_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    Ok(client)
}

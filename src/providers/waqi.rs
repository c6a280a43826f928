//! World Air Quality Index station feed.
//!
//! The nearest station's readings are only trusted when the station lies
//! within a fixed radius of the query point; otherwise the feed reports no
//! data and the caller falls back to the next provider.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{send_json, AirQualityProvider};
use crate::aqi::haversine_km;
use crate::models::{AirQuality, AqiSource, Coordinates, Pollutant, PollutantReading};

// ---

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct RawFeed {
    /// Station AQI; WAQI reports "-" when the station has no current value.
    #[serde(default)]
    aqi: Value,
    #[serde(default)]
    city: RawStation,
    #[serde(default)]
    iaqi: RawIaqi,
}

#[derive(Debug, Default, Deserialize)]
struct RawStation {
    name: Option<String>,
    #[serde(default)]
    geo: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawIaqi {
    pm25: Option<RawValue>,
    pm10: Option<RawValue>,
    no2: Option<RawValue>,
    so2: Option<RawValue>,
    o3: Option<RawValue>,
    co: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    v: Option<f64>,
}

fn as_f64(value: &Value) -> Option<f64> {
    // ---
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl RawStation {
    fn position(&self) -> Option<(f64, f64)> {
        match self.geo.as_slice() {
            [lat, lon, ..] => Some((as_f64(lat)?, as_f64(lon)?)),
            _ => None,
        }
    }
}

impl RawFeed {
    fn to_air_quality(&self) -> Option<AirQuality> {
        // ---
        let aqi = as_f64(&self.aqi).filter(|a| a.is_finite() && *a >= 0.0)?;
        let i = &self.iaqi;
        let pollutants = PollutantReading::new(
            [
                (Pollutant::Pm25, &i.pm25),
                (Pollutant::Pm10, &i.pm10),
                (Pollutant::No2, &i.no2),
                (Pollutant::So2, &i.so2),
                (Pollutant::O3, &i.o3),
                (Pollutant::Co, &i.co),
            ]
            .into_iter()
            .filter_map(|(p, raw)| raw.as_ref().and_then(|r| r.v).map(|v| (p, v))),
        );

        Some(AirQuality {
            aqi: aqi.round().min(crate::aqi::AQI_MAX as f64) as u16,
            source: AqiSource::Station,
            pollutants,
            station_name: self.city.name.clone(),
        })
    }
}

/// Interpret a WAQI feed envelope for a query point.
///
/// Returns `None` for a non-"ok" status, a station farther than
/// `max_distance_km`, or a station without a current AQI. A station with no
/// published position is accepted.
fn interpret_feed(envelope: Value, at: Coordinates, max_distance_km: f64) -> Option<AirQuality> {
    // ---
    if envelope.get("status").and_then(Value::as_str) != Some("ok") {
        let detail = envelope.get("data").cloned().unwrap_or_default();
        debug!("WAQI status not ok: {}", detail);
        return None;
    }

    let feed: RawFeed = match envelope.get("data").cloned().map(serde_json::from_value::<RawFeed>) {
        Some(Ok(feed)) => feed,
        Some(Err(e)) => {
            debug!("WAQI payload did not parse: {}", e);
            return None;
        }
        None => return None,
    };

    if let Some(station) = feed.city.position() {
        let distance = haversine_km((at.lat, at.lon), station);
        info!(
            "WAQI station distance: {:.1} km ({})",
            distance,
            feed.city.name.as_deref().unwrap_or("unknown")
        );
        if distance > max_distance_km {
            info!("WAQI station too far (>{} km), falling back", max_distance_km);
            return None;
        }
    }

    feed.to_air_quality()
}

/// Client for the WAQI geo feed.
#[derive(Clone)]
pub struct WaqiClient {
    client: Client,
    base_url: String,
    token: String,
    max_distance_km: f64,
}

impl WaqiClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        max_distance_km: f64,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            max_distance_km,
        }
    }
}

#[async_trait]
impl AirQualityProvider for WaqiClient {
    fn name(&self) -> &'static str {
        "waqi"
    }

    async fn current_air_quality(&self, at: Coordinates) -> Result<Option<AirQuality>> {
        // ---
        let url = format!("{}/feed/geo:{};{}/", self.base_url, at.lat, at.lon);
        let request = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .timeout(TIMEOUT);

        let envelope: Value = send_json(request).await?;
        Ok(interpret_feed(envelope, at, self.max_distance_km))
    }
}

//! OpenWeatherMap: geocoding, current weather and the air pollution family
//! of endpoints (current, forecast, history).

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{send_json, AirQualityProvider, OutlookProvider, WeatherProvider};
use crate::aqi::{aqi_from_pm25, aqi_from_provider_index};
use crate::models::{
    AirQuality, AqiSource, Coordinates, CurrentWeather, ForecastDay, GeoLocation, Pollutant,
    PollutantReading,
};

// ---

const TIMEOUT: Duration = Duration::from_secs(5);
const GEOCODE_LIMIT: u32 = 5;
const FORECAST_DAYS: usize = 5;
const HISTORY_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct RawWeather {
    #[serde(default)]
    main: RawMain,
    #[serde(default)]
    weather: Vec<RawCondition>,
    name: Option<String>,
    #[serde(default)]
    sys: RawSys,
}

#[derive(Debug, Default, Deserialize)]
struct RawMain {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSys {
    country: Option<String>,
}

impl RawWeather {
    fn into_current(self) -> CurrentWeather {
        // ---
        let condition = self.weather.into_iter().next();
        let (description, icon) = match condition {
            Some(c) => (c.description, c.icon),
            None => (None, None),
        };

        CurrentWeather {
            temperature: self.main.temp,
            humidity: self.main.humidity,
            description,
            icon,
            city: self.name.filter(|n| !n.is_empty()),
            country: self.sys.country,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGeocode {
    lat: f64,
    lon: f64,
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPollution {
    #[serde(default)]
    list: Vec<RawPollutionRecord>,
}

#[derive(Debug, Deserialize)]
struct RawPollutionRecord {
    #[serde(default)]
    dt: i64,
    #[serde(default)]
    main: RawIndex,
    #[serde(default)]
    components: RawComponents,
}

#[derive(Debug, Default, Deserialize)]
struct RawIndex {
    aqi: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct RawComponents {
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    no2: Option<f64>,
    so2: Option<f64>,
    o3: Option<f64>,
    co: Option<f64>,
}

impl RawPollutionRecord {
    /// AQI from PM2.5 when reported, otherwise from the coarse 1-5 index.
    fn aqi(&self) -> (u16, AqiSource) {
        // ---
        match self.components.pm2_5 {
            Some(pm25) => (aqi_from_pm25(pm25), AqiSource::Pm25),
            None => (
                aqi_from_provider_index(self.main.aqi.unwrap_or(0)),
                AqiSource::ProviderIndex,
            ),
        }
    }

    fn to_air_quality(&self) -> AirQuality {
        // ---
        let c = &self.components;
        let pollutants = PollutantReading::new(
            [
                (Pollutant::Pm25, c.pm2_5),
                (Pollutant::Pm10, c.pm10),
                (Pollutant::No2, c.no2),
                (Pollutant::So2, c.so2),
                (Pollutant::O3, c.o3),
                (Pollutant::Co, c.co),
            ]
            .into_iter()
            .filter_map(|(p, v)| v.map(|v| (p, v))),
        );
        let (aqi, source) = self.aqi();

        AirQuality {
            aqi,
            source,
            pollutants,
            station_name: None,
        }
    }
}

/// Group hourly records by UTC calendar day and keep each day's maximum AQI.
///
/// Days come back in chronological order.
fn daily_max(records: &[RawPollutionRecord]) -> Vec<ForecastDay> {
    // ---
    let mut days: BTreeMap<String, ForecastDay> = BTreeMap::new();

    for record in records {
        let Some(at) = DateTime::<Utc>::from_timestamp(record.dt, 0) else {
            continue;
        };
        let (aqi, _) = record.aqi();
        let date = at.format("%Y-%m-%d").to_string();

        days.entry(date.clone())
            .and_modify(|d| d.max_aqi = d.max_aqi.max(aqi))
            .or_insert_with(|| ForecastDay {
                day: at.format("%a").to_string(),
                date,
                max_aqi: aqi,
            });
    }

    days.into_values().collect()
}

/// Client for the OpenWeatherMap REST API.
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn pollution(&self, path: &str, params: &[(&str, String)]) -> Result<RawPollution> {
        // ---
        let url = format!("{}/data/2.5/{}", self.base_url, path);
        debug!("Fetching OpenWeatherMap {}", path);

        let request = self
            .client
            .get(&url)
            .query(params)
            .query(&[("appid", &self.api_key)])
            .timeout(TIMEOUT);
        send_json(request).await
    }
}

fn coordinate_params(at: Coordinates) -> Vec<(&'static str, String)> {
    vec![("lat", at.lat.to_string()), ("lon", at.lon.to_string())]
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn geocode(&self, city: &str, country: Option<&str>) -> Result<Vec<GeoLocation>> {
        // ---
        let query = match country.map(str::trim).filter(|c| !c.is_empty()) {
            Some(country) => format!("{},{}", city.trim(), country),
            None => city.trim().to_string(),
        };
        let url = format!("{}/geo/1.0/direct", self.base_url);
        let limit = GEOCODE_LIMIT.to_string();

        let request = self
            .client
            .get(&url)
            .query(&[
                ("q", query.as_str()),
                ("limit", limit.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .timeout(TIMEOUT);
        let raw: Vec<RawGeocode> = send_json(request).await?;

        Ok(raw
            .into_iter()
            .map(|loc| GeoLocation {
                lat: loc.lat,
                lon: loc.lon,
                name: loc.name,
                country: loc.country,
                state: loc.state.unwrap_or_default(),
            })
            .collect())
    }

    async fn current_weather(&self, at: Coordinates) -> Result<CurrentWeather> {
        // ---
        let url = format!("{}/data/2.5/weather", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&coordinate_params(at))
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")])
            .timeout(TIMEOUT);

        let raw: RawWeather = send_json(request).await?;
        Ok(raw.into_current())
    }
}

#[async_trait]
impl AirQualityProvider for OpenWeatherClient {
    fn name(&self) -> &'static str {
        "openweathermap"
    }

    async fn current_air_quality(&self, at: Coordinates) -> Result<Option<AirQuality>> {
        // ---
        let raw = self.pollution("air_pollution", &coordinate_params(at)).await?;
        Ok(raw.list.first().map(RawPollutionRecord::to_air_quality))
    }
}

#[async_trait]
impl OutlookProvider for OpenWeatherClient {
    async fn forecast(&self, at: Coordinates) -> Result<Vec<ForecastDay>> {
        // ---
        let raw = self.pollution("air_pollution/forecast", &coordinate_params(at)).await?;
        let mut days = daily_max(&raw.list);
        days.truncate(FORECAST_DAYS);
        Ok(days)
    }

    async fn history(&self, at: Coordinates, now: DateTime<Utc>) -> Result<Vec<ForecastDay>> {
        // ---
        let start = now - chrono::Duration::days(HISTORY_DAYS);
        let mut params = coordinate_params(at);
        params.push(("start", start.timestamp().to_string()));
        params.push(("end", now.timestamp().to_string()));

        let raw = self.pollution("air_pollution/history", &params).await?;
        Ok(daily_max(&raw.list))
    }
}

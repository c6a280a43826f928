//! Data models for the advisory pipeline.
//!
//! Upstream payloads are reshaped into these types once, at the provider
//! boundary, and are read-only for the rest of the request.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::aqi::{cigarette_equivalent, RiskTier};
use crate::planner::DailyPlan;

// ---

/// Pollutants recorded for display. Only PM2.5 drives the AQI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pollutant {
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    #[serde(rename = "NO2")]
    No2,
    #[serde(rename = "SO2")]
    So2,
    #[serde(rename = "O3")]
    O3,
    #[serde(rename = "CO")]
    Co,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::O3,
        Pollutant::Co,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO2",
            Pollutant::So2 => "SO2",
            Pollutant::O3 => "O3",
            Pollutant::Co => "CO",
        }
    }
}

/// Wire shape of a single pollutant entry: `{"concentration": 12.3}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Concentration {
    #[serde(default)]
    pub concentration: f64,
}

/// Concentrations (µg/m³) for every tracked pollutant.
///
/// Missing pollutants read as 0 and negative values are clamped to 0 at
/// construction, so a reading always covers all of [`Pollutant::ALL`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<Pollutant, Concentration>",
    into = "BTreeMap<Pollutant, Concentration>"
)]
pub struct PollutantReading {
    values: BTreeMap<Pollutant, f64>,
}

impl PollutantReading {
    // ---
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (Pollutant, f64)>,
    {
        // ---
        let mut map: BTreeMap<Pollutant, f64> = Pollutant::ALL.iter().map(|p| (*p, 0.0)).collect();
        for (pollutant, value) in values {
            let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
            map.insert(pollutant, value);
        }
        Self { values: map }
    }

    pub fn get(&self, pollutant: Pollutant) -> f64 {
        self.values.get(&pollutant).copied().unwrap_or(0.0)
    }

    pub fn pm25(&self) -> f64 {
        self.get(Pollutant::Pm25)
    }
}

impl Default for PollutantReading {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

impl From<BTreeMap<Pollutant, Concentration>> for PollutantReading {
    fn from(raw: BTreeMap<Pollutant, Concentration>) -> Self {
        Self::new(raw.into_iter().map(|(p, c)| (p, c.concentration)))
    }
}

impl From<PollutantReading> for BTreeMap<Pollutant, Concentration> {
    fn from(reading: PollutantReading) -> Self {
        reading
            .values
            .into_iter()
            .map(|(p, concentration)| (p, Concentration { concentration }))
            .collect()
    }
}

impl fmt::Display for PollutantReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(p, v)| format!("{}: {:.1} µg/m³", p.symbol(), v))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// How the AQI of a snapshot was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiSource {
    /// US AQI reported directly by a monitoring station.
    Station,
    /// Derived from PM2.5 with the EPA breakpoint formula.
    Pm25,
    /// Remapped from a coarse 1-5 provider index.
    ProviderIndex,
    /// No air-quality provider answered.
    #[default]
    Unavailable,
}

/// Validated query coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Parse path segments into coordinates, rejecting out-of-range values.
    pub fn parse(lat: &str, lon: &str) -> Result<Self> {
        // ---
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid latitude '{}': {}", lat, e))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid longitude '{}': {}", lon, e))?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(anyhow!("Latitude out of range: {}", lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(anyhow!("Longitude out of range: {}", lon));
        }
        Ok(Self { lat, lon })
    }
}

/// Current conditions from the weather provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentWeather {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// One air-quality observation from whichever provider answered.
#[derive(Debug, Clone, PartialEq)]
pub struct AirQuality {
    pub aqi: u16,
    pub source: AqiSource,
    pub pollutants: PollutantReading,
    pub station_name: Option<String>,
}

impl AirQuality {
    /// Placeholder used when every air-quality provider failed.
    pub fn unavailable() -> Self {
        Self {
            aqi: 0,
            source: AqiSource::Unavailable,
            pollutants: PollutantReading::default(),
            station_name: None,
        }
    }
}

/// Everything the pipeline knows about the query location, built once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    // ---
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub aqi: u16,
    #[serde(default)]
    pub aqi_source: AqiSource,
    #[serde(default)]
    pub pollutants: PollutantReading,
    pub lat: f64,
    pub lon: f64,
    /// Active fire detections upwind; no feed is wired, callers may supply it.
    #[serde(default)]
    pub fire_count: u32,
}

impl EnvironmentSnapshot {
    /// Combine weather and air quality into a snapshot.
    ///
    /// City name priority: explicit override, then the weather provider's
    /// name, then the monitoring station name.
    pub fn assemble(
        at: Coordinates,
        weather: CurrentWeather,
        air: AirQuality,
        city_override: Option<&str>,
    ) -> Self {
        // ---
        let city = city_override
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .or(weather.city)
            .or(air.station_name);

        Self {
            temperature: weather.temperature,
            humidity: weather.humidity,
            description: weather.description,
            icon: weather.icon,
            city,
            country: weather.country,
            aqi: air.aqi,
            aqi_source: air.source,
            pollutants: air.pollutants,
            lat: at.lat,
            lon: at.lon,
            fire_count: 0,
        }
    }

    pub fn cigarettes(&self) -> f64 {
        cigarette_equivalent(self.pollutants.pm25())
    }

    pub fn risk_tier(&self) -> RiskTier {
        RiskTier::from_aqi(self.aqi as i32)
    }
}

/// Fields an advisory oracle may return when it answers with JSON.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StructuredAnalysis {
    // ---
    #[serde(default, alias = "health_advice", alias = "advice")]
    pub assessment: String,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub smoke_arrival_hours: Option<f64>,
    #[serde(default)]
    pub breathlessness_risk: Option<f64>,
    #[serde(default)]
    pub morning_plan: Option<String>,
    #[serde(default)]
    pub afternoon_plan: Option<String>,
    #[serde(default)]
    pub evening_plan: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub source_narrative: Option<String>,
}

impl StructuredAnalysis {
    fn is_empty(&self) -> bool {
        self.assessment.trim().is_empty()
            && self.morning_plan.is_none()
            && self.afternoon_plan.is_none()
            && self.evening_plan.is_none()
            && self.risk_level.is_none()
    }
}

/// Oracle output, classified once when it crosses into the service.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthAnalysis {
    /// Free-form markdown.
    RawText(String),
    /// A JSON object with known fields.
    Structured(StructuredAnalysis),
}

impl HealthAnalysis {
    /// Classify an oracle answer.
    ///
    /// A JSON object (optionally inside a ```` ```json ```` fence) with at
    /// least one recognised field becomes [`HealthAnalysis::Structured`];
    /// anything else is kept verbatim as [`HealthAnalysis::RawText`].
    pub fn parse(raw: &str) -> Self {
        // ---
        let candidate = strip_code_fence(raw);
        if candidate.starts_with('{') {
            if let Ok(structured) = serde_json::from_str::<StructuredAnalysis>(candidate) {
                if !structured.is_empty() {
                    return HealthAnalysis::Structured(structured);
                }
            }
        }
        HealthAnalysis::RawText(raw.trim().to_string())
    }

    /// Markdown shown to the user as the health advice.
    pub fn advice_text(&self) -> &str {
        match self {
            HealthAnalysis::RawText(text) => text,
            HealthAnalysis::Structured(s) => &s.assessment,
        }
    }

    pub fn sources(&self) -> &[String] {
        match self {
            HealthAnalysis::RawText(_) => &[],
            HealthAnalysis::Structured(s) => &s.sources,
        }
    }

    pub fn source_narrative(&self) -> Option<&str> {
        match self {
            HealthAnalysis::RawText(_) => None,
            HealthAnalysis::Structured(s) => s.source_narrative.as_deref(),
        }
    }
}

/// Return the body of a fenced code block if `raw` contains one, else `raw` trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    // ---
    let trimmed = raw.trim();
    let body = if let Some((_, rest)) = trimmed.split_once("```json") {
        rest
    } else if let Some((_, rest)) = trimmed.split_once("```") {
        rest
    } else {
        return trimmed;
    };
    body.split("```").next().unwrap_or(body).trim()
}

/// A geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub state: String,
}

/// A pollution news headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub source: String,
    pub date: String,
}

/// Emergency phone numbers for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContacts {
    pub ambulance: String,
    pub police: String,
    pub general: String,
    pub notes: String,
}

/// Daily maximum AQI for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Short weekday name, e.g. "Mon".
    pub day: String,
    /// ISO date, e.g. "2025-01-06".
    pub date: String,
    pub max_aqi: u16,
}

/// Best and worst day of a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAnalysis {
    pub best_day: String,
    pub best_aqi: u16,
    pub worst_day: String,
    pub worst_aqi: u16,
}

/// The single structure the web layer serialises for `/api/environment`.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub environment: EnvironmentSnapshot,
    pub cigarettes: f64,
    pub risk_tier: RiskTier,
    pub forecast: Vec<ForecastDay>,
    pub history: Vec<ForecastDay>,
    pub forecast_analysis: ForecastAnalysis,
    pub news: Vec<NewsItem>,
    pub health_advice: String,
    pub sources: Vec<String>,
    pub source_narrative: Option<String>,
    pub daily_plan: DailyPlan,
}

/// Response of the standalone advisory endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryReport {
    pub health_advice: String,
    pub sources: Vec<String>,
    pub source_narrative: Option<String>,
    pub daily_plan: DailyPlan,
}

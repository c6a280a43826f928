//! Request orchestration.
//!
//! `EnvironmentService` turns coordinates into an [`EnvironmentReport`] by
//! calling the providers one after another. Only the weather fetch is allowed
//! to fail the request; every other collaborator degrades to a default and
//! logs a warning.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::cache::{CacheKey, ResponseCache};
use crate::models::{
    AdvisoryReport, AirQuality, Coordinates, EmergencyContacts, EnvironmentReport,
    EnvironmentSnapshot, ForecastDay, GeoLocation, HealthAnalysis, NewsItem,
};
use crate::planner::{analyze_forecast, generate_plan, Planner};
use crate::providers::emergency;
use crate::providers::{
    AdvisoryOracle, AirQualityProvider, NewsProvider, OutlookProvider, WeatherProvider,
};

// ---

/// Advice text used when the oracle is unconfigured or fails.
pub const FALLBACK_ADVICE: &str = "Health advice unavailable.";

pub struct EnvironmentService {
    weather: Arc<dyn WeatherProvider>,
    air_quality: Vec<Arc<dyn AirQualityProvider>>,
    outlook: Option<Arc<dyn OutlookProvider>>,
    oracle: Option<Arc<dyn AdvisoryOracle>>,
    news: Option<Arc<dyn NewsProvider>>,
    cache: Arc<dyn ResponseCache>,
    /// `None` plans with the standard policy.
    planner: Option<Planner>,
    news_limit: usize,
}

impl EnvironmentService {
    /// A service with only a weather provider; add the rest with the `with_*` methods.
    pub fn new(weather: Arc<dyn WeatherProvider>, cache: Arc<dyn ResponseCache>) -> Self {
        Self {
            weather,
            air_quality: Vec::new(),
            outlook: None,
            oracle: None,
            news: None,
            cache,
            planner: None,
            news_limit: 5,
        }
    }

    /// Append an air-quality provider. Providers are tried in insertion order.
    pub fn with_air_quality(mut self, provider: Arc<dyn AirQualityProvider>) -> Self {
        self.air_quality.push(provider);
        self
    }

    pub fn with_outlook(mut self, provider: Arc<dyn OutlookProvider>) -> Self {
        self.outlook = Some(provider);
        self
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn AdvisoryOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_news(mut self, provider: Arc<dyn NewsProvider>, limit: usize) -> Self {
        self.news = Some(provider);
        self.news_limit = limit;
        self
    }

    pub fn with_planner(mut self, planner: Planner) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Cached, serialised [`EnvironmentReport`] for a location.
    pub async fn report(&self, at: Coordinates, city: Option<&str>) -> Result<Value> {
        // ---
        let key = CacheKey::new(at.lat, at.lon, city);
        if let Some(hit) = self.cache.get(&key).await {
            debug!("Cache hit for {:?}", key);
            return Ok(hit);
        }

        let span = info_span!(
            "environment_report",
            request_id = %Uuid::new_v4(),
            lat = at.lat,
            lon = at.lon
        );
        let report = self.build_report(at, city).instrument(span).await?;
        let value = serde_json::to_value(&report)?;

        self.cache.put(key, value.clone()).await;
        Ok(value)
    }

    /// Fetch everything for a location, bypassing the cache.
    pub async fn build_report(&self, at: Coordinates, city: Option<&str>) -> Result<EnvironmentReport> {
        // ---
        info!("Building environment report");

        let weather = self
            .weather
            .current_weather(at)
            .await
            .context("Weather fetch failed")?;
        let air = self.current_air_quality(at).await;
        let environment = EnvironmentSnapshot::assemble(at, weather, air, city);
        info!(
            "Snapshot for {}: AQI {} ({:?})",
            environment.city.as_deref().unwrap_or("unknown"),
            environment.aqi,
            environment.aqi_source
        );

        let (forecast, history) = self.outlook(at).await;
        let forecast_analysis = analyze_forecast(&forecast);

        let advisory = self.advise(&environment).await;

        let news = match environment.city.as_deref() {
            Some(city) => self.news(city, self.news_limit).await,
            None => Vec::new(),
        };

        Ok(EnvironmentReport {
            cigarettes: environment.cigarettes(),
            risk_tier: environment.risk_tier(),
            environment,
            forecast,
            history,
            forecast_analysis,
            news,
            health_advice: advisory.health_advice,
            sources: advisory.sources,
            source_narrative: advisory.source_narrative,
            daily_plan: advisory.daily_plan,
        })
    }

    /// Oracle advice plus the rule-based plan for a snapshot.
    pub async fn advise(&self, env: &EnvironmentSnapshot) -> AdvisoryReport {
        // ---
        let analysis = match &self.oracle {
            Some(oracle) => match oracle.assess(env).await {
                Ok(analysis) => Some(analysis),
                Err(e) => {
                    warn!("Advisory oracle failed: {:#}", e);
                    None
                }
            },
            None => None,
        };

        let aqi = i32::from(env.aqi);
        let daily_plan = match self.planner {
            Some(planner) => planner.generate(aqi, env.fire_count, analysis.as_ref()),
            None => generate_plan(aqi, env.fire_count, analysis.as_ref()),
        };

        match analysis {
            Some(analysis) => AdvisoryReport {
                health_advice: advice_or_fallback(&analysis),
                sources: analysis.sources().to_vec(),
                source_narrative: analysis.source_narrative().map(String::from),
                daily_plan,
            },
            None => AdvisoryReport {
                health_advice: FALLBACK_ADVICE.to_string(),
                sources: Vec::new(),
                source_narrative: None,
                daily_plan,
            },
        }
    }

    pub async fn geocode(&self, city: &str, country: Option<&str>) -> Vec<GeoLocation> {
        // ---
        match self.weather.geocode(city, country).await {
            Ok(locations) => locations,
            Err(e) => {
                warn!("Geocoding '{}' failed: {:#}", city, e);
                Vec::new()
            }
        }
    }

    pub async fn news(&self, city: &str, limit: usize) -> Vec<NewsItem> {
        // ---
        let Some(provider) = &self.news else {
            return Vec::new();
        };
        match provider.headlines(city, limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!("News fetch for '{}' failed: {:#}", city, e);
                Vec::new()
            }
        }
    }

    /// Emergency numbers: built-in tables, then the oracle, then 112.
    pub async fn support(&self, city: &str, country: &str) -> EmergencyContacts {
        // ---
        if let Some(contacts) = emergency::lookup(city, country) {
            return contacts;
        }

        let Some(oracle) = &self.oracle else {
            return emergency::fallback_contacts();
        };
        match oracle.emergency_contacts(city, country).await {
            Ok(contacts) => contacts,
            Err(e) => {
                warn!("Emergency lookup for {}, {} failed: {:#}", city, country, e);
                emergency::fallback_contacts()
            }
        }
    }

    async fn current_air_quality(&self, at: Coordinates) -> AirQuality {
        // ---
        for provider in &self.air_quality {
            match provider.current_air_quality(at).await {
                Ok(Some(air)) => {
                    debug!("Air quality from {}: AQI {}", provider.name(), air.aqi);
                    return air;
                }
                Ok(None) => debug!("{} had no usable data", provider.name()),
                Err(e) => warn!("{} air quality failed: {:#}", provider.name(), e),
            }
        }

        warn!("No air-quality provider answered; AQI defaults to 0");
        AirQuality::unavailable()
    }

    async fn outlook(&self, at: Coordinates) -> (Vec<ForecastDay>, Vec<ForecastDay>) {
        // ---
        let Some(outlook) = &self.outlook else {
            return (Vec::new(), Vec::new());
        };

        let forecast = outlook.forecast(at).await.unwrap_or_else(|e| {
            warn!("Forecast fetch failed: {:#}", e);
            Vec::new()
        });
        let history = outlook.history(at, Utc::now()).await.unwrap_or_else(|e| {
            warn!("History fetch failed: {:#}", e);
            Vec::new()
        });
        (forecast, history)
    }
}

fn advice_or_fallback(analysis: &HealthAnalysis) -> String {
    let text = analysis.advice_text().trim();
    if text.is_empty() {
        FALLBACK_ADVICE.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    // ---
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use anyhow::bail;
    use async_trait::async_trait;
    use chrono::DateTime;

    use crate::aqi::aqi_from_pm25;
    use crate::cache::{MokaCache, NoCache};
    use crate::models::{AqiSource, CurrentWeather, Pollutant, PollutantReading};
    use crate::planner::TieringPolicy;

    #[derive(Default)]
    pub(crate) struct FakeWeather {
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn geocode(&self, city: &str, country: Option<&str>) -> Result<Vec<GeoLocation>> {
            // ---
            if self.fail {
                bail!("geocoder down");
            }
            Ok(vec![GeoLocation {
                lat: 28.61,
                lon: 77.21,
                name: city.to_string(),
                country: country.unwrap_or("IN").to_string(),
                state: "Delhi".to_string(),
            }])
        }

        async fn current_weather(&self, _at: Coordinates) -> Result<CurrentWeather> {
            // ---
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("Request failed with status: 401 Unauthorized");
            }
            Ok(CurrentWeather {
                temperature: Some(31.0),
                humidity: Some(45.0),
                description: Some("haze".to_string()),
                icon: Some("50d".to_string()),
                city: Some("Delhi".to_string()),
                country: Some("IN".to_string()),
            })
        }
    }

    pub(crate) enum FakeAir {
        Reading(f64),
        Empty,
        Broken,
    }

    #[async_trait]
    impl AirQualityProvider for FakeAir {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn current_air_quality(&self, _at: Coordinates) -> Result<Option<AirQuality>> {
            // ---
            match self {
                FakeAir::Reading(pm25) => Ok(Some(AirQuality {
                    aqi: aqi_from_pm25(*pm25),
                    source: AqiSource::Pm25,
                    pollutants: PollutantReading::new([(Pollutant::Pm25, *pm25)]),
                    station_name: None,
                })),
                FakeAir::Empty => Ok(None),
                FakeAir::Broken => bail!("timeout"),
            }
        }
    }

    pub(crate) struct FakeOracle {
        pub answer: Option<&'static str>,
    }

    #[async_trait]
    impl AdvisoryOracle for FakeOracle {
        async fn assess(&self, _env: &EnvironmentSnapshot) -> Result<HealthAnalysis> {
            match self.answer {
                Some(text) => Ok(HealthAnalysis::parse(text)),
                None => bail!("Request failed with status: 503 Service Unavailable"),
            }
        }

        async fn emergency_contacts(&self, _city: &str, _country: &str) -> Result<EmergencyContacts> {
            // ---
            match self.answer {
                Some(text) => Ok(serde_json::from_str(text)?),
                None => bail!("oracle down"),
            }
        }
    }

    struct FakeOutlook;

    #[async_trait]
    impl OutlookProvider for FakeOutlook {
        async fn forecast(&self, _at: Coordinates) -> Result<Vec<ForecastDay>> {
            // ---
            let day = |day: &str, date: &str, max_aqi| ForecastDay {
                day: day.to_string(),
                date: date.to_string(),
                max_aqi,
            };
            Ok(vec![
                day("Mon", "2025-01-06", 180),
                day("Tue", "2025-01-07", 95),
                day("Wed", "2025-01-08", 240),
            ])
        }

        async fn history(&self, _at: Coordinates, _now: DateTime<Utc>) -> Result<Vec<ForecastDay>> {
            bail!("history not available")
        }
    }

    struct FakeNews;

    #[async_trait]
    impl NewsProvider for FakeNews {
        async fn headlines(&self, city: &str, limit: usize) -> Result<Vec<NewsItem>> {
            // ---
            Ok((0..limit)
                .map(|i| NewsItem {
                    title: format!("{} headline {}", city, i),
                    link: "#".to_string(),
                    source: "Google News".to_string(),
                    date: String::new(),
                })
                .collect())
        }
    }

    fn delhi() -> Coordinates {
        Coordinates {
            lat: 28.61,
            lon: 77.21,
        }
    }

    pub(crate) fn create_test_service(weather: Arc<FakeWeather>, oracle: Option<&'static str>) -> EnvironmentService {
        // ---
        EnvironmentService::new(weather, Arc::new(NoCache))
            .with_air_quality(Arc::new(FakeAir::Empty))
            .with_air_quality(Arc::new(FakeAir::Reading(60.0)))
            .with_outlook(Arc::new(FakeOutlook))
            .with_oracle(Arc::new(FakeOracle { answer: oracle }))
            .with_news(Arc::new(FakeNews), 2)
    }

    #[tokio::test]
    async fn test_report_falls_through_air_providers() {
        // ---
        let service = create_test_service(Arc::new(FakeWeather::default()), None);
        let report = service.build_report(delhi(), None).await.unwrap();

        assert_eq!(report.environment.aqi, aqi_from_pm25(60.0));
        assert_eq!(report.environment.aqi_source, AqiSource::Pm25);
        assert_eq!(report.environment.city.as_deref(), Some("Delhi"));
        assert_eq!(report.cigarettes, 2.7);
        assert_eq!(report.daily_plan.mask_level, "N95/KN95");
        assert_eq!(report.news.len(), 2);
    }

    #[tokio::test]
    async fn test_weather_failure_propagates() {
        // ---
        let weather = Arc::new(FakeWeather {
            fail: true,
            ..Default::default()
        });
        let service = create_test_service(weather, None);
        let err = service.report(delhi(), None).await.unwrap_err();

        assert!(format!("{:#}", err).contains("401"));
    }

    #[tokio::test]
    async fn test_no_air_quality_defaults_to_zero() {
        // ---
        let service = EnvironmentService::new(Arc::new(FakeWeather::default()), Arc::new(NoCache))
            .with_air_quality(Arc::new(FakeAir::Broken))
            .with_air_quality(Arc::new(FakeAir::Empty));
        let report = service.build_report(delhi(), Some("Old Delhi")).await.unwrap();

        assert_eq!(report.environment.aqi, 0);
        assert_eq!(report.environment.aqi_source, AqiSource::Unavailable);
        assert_eq!(report.environment.city.as_deref(), Some("Old Delhi"));
        assert_eq!(report.health_advice, FALLBACK_ADVICE);
        assert_eq!(report.daily_plan.mask_level, "Optional");
        assert!(report.forecast.is_empty());
        assert!(report.news.is_empty());
    }

    #[tokio::test]
    async fn test_outlook_failures_are_isolated() {
        // ---
        let service = create_test_service(Arc::new(FakeWeather::default()), None);
        let report = service.build_report(delhi(), None).await.unwrap();

        assert_eq!(report.forecast.len(), 3);
        assert!(report.history.is_empty());
        assert_eq!(report.forecast_analysis.best_day, "Tue (2025-01-07)");
        assert_eq!(report.forecast_analysis.worst_aqi, 240);
    }

    #[tokio::test]
    async fn test_oracle_sections_replace_canned_plan() {
        // ---
        let answer = "### Executive Summary\nPoor air.\n\n### 🌅 Morning Plan\nStay in and rest.\n\n### Evening Plan\n";
        let service = create_test_service(Arc::new(FakeWeather::default()), Some(answer));
        let report = service.build_report(delhi(), None).await.unwrap();

        assert!(report.health_advice.starts_with("### Executive Summary"));
        assert_eq!(report.daily_plan.morning_plan, "Stay in and rest.");
        // empty section keeps the canned lines
        assert!(report.daily_plan.evening_plan.contains("**Activity**"));
    }

    #[tokio::test]
    async fn test_structured_advice_carries_sources() {
        // ---
        let answer = r#"{"assessment": "Limit exposure", "sources": ["Traffic", "Construction dust"],
                         "source_narrative": "Evening traffic peaks"}"#;
        let service = create_test_service(Arc::new(FakeWeather::default()), Some(answer));
        let env = service.build_report(delhi(), None).await.unwrap().environment;
        let advisory = service.advise(&env).await;

        assert_eq!(advisory.health_advice, "Limit exposure");
        assert_eq!(advisory.sources, vec!["Traffic".to_string(), "Construction dust".to_string()]);
        assert_eq!(advisory.source_narrative.as_deref(), Some("Evening traffic peaks"));
    }

    #[tokio::test]
    async fn test_planner_policy_applies() {
        // ---
        let weather = Arc::new(FakeWeather::default());
        let standard = EnvironmentService::new(weather.clone(), Arc::new(NoCache));
        let extended = EnvironmentService::new(weather, Arc::new(NoCache))
            .with_planner(Planner::new(TieringPolicy::Extended));

        let env = standard.build_report(delhi(), None).await.unwrap().environment;
        assert_eq!(env.aqi, 0);
        assert_eq!(standard.advise(&env).await.daily_plan.hydration_ml, 2000);
        assert_eq!(extended.advise(&env).await.daily_plan.hydration_ml, 2500);
    }

    #[tokio::test]
    async fn test_report_is_cached() {
        // ---
        let weather = Arc::new(FakeWeather::default());
        let service = EnvironmentService::new(
            weather.clone(),
            Arc::new(MokaCache::new(Duration::from_secs(60), 10)),
        )
        .with_air_quality(Arc::new(FakeAir::Reading(20.0)));

        let first = service.report(delhi(), Some("Delhi")).await.unwrap();
        let second = service.report(delhi(), Some(" delhi ")).await.unwrap();
        service.report(delhi(), Some("Noida")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first["environment"]["aqi"], aqi_from_pm25(20.0));
        assert_eq!(weather.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_geocode_failure_is_empty() {
        // ---
        let weather = Arc::new(FakeWeather {
            fail: true,
            ..Default::default()
        });
        let service = create_test_service(weather, None);
        assert!(service.geocode("Delhi", None).await.is_empty());

        let service = create_test_service(Arc::new(FakeWeather::default()), None);
        assert_eq!(service.geocode("Delhi", Some("IN")).await[0].state, "Delhi");
    }

    #[tokio::test]
    async fn test_support_lookup_order() {
        // ---
        let service = create_test_service(Arc::new(FakeWeather::default()), None);
        assert_eq!(service.support("Mumbai", "IN").await.ambulance, "108");
        assert_eq!(service.support("Lagos", "NG").await, emergency::fallback_contacts());

        let answer = r#"{"ambulance": "112", "police": "112", "general": "112", "notes": "Nigeria"}"#;
        let service = create_test_service(Arc::new(FakeWeather::default()), Some(answer));
        assert_eq!(service.support("Lagos", "NG").await.notes, "Nigeria");
    }
}

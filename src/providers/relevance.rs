//! Relevance AI studio trigger, used as the advisory oracle.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{send_json, AdvisoryOracle};
use crate::config::RelevanceConfig;
use crate::models::{strip_code_fence, EmergencyContacts, EnvironmentSnapshot, HealthAnalysis};

// ---

const TIMEOUT: Duration = Duration::from_secs(30);

fn fmt_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Prompt asking for a markdown assessment with per-period plan sections.
fn health_prompt(env: &EnvironmentSnapshot) -> String {
    // ---
    let tier = env.risk_tier().label();
    format!(
        "**Environmental Data:**\n\
         - AQI: {aqi} (Risk Level: {tier})\n\
         - Temperature: {temp}°C\n\
         - Humidity: {humidity}%\n\
         - Condition: {condition}\n\
         - Location: {city}\n\n\
         **Pollutant Breakdown:**\n{pollutants}\n\n\
         **Task:**\n\
         Provide a detailed, scientifically-backed daily health plan in markdown.\n\
         Your advice MUST be derived from the AQI of {aqi} ({tier}).\n\
         - IF AQI > 150: strictly forbid outdoor strenuous exercise and recommend N95 masks.\n\
         - IF AQI < 100: encourage ventilation and outdoor activities.\n\n\
         **Required Output Format:**\n\n\
         ### Executive Summary\n(One sentence summary)\n\n\
         ### Key Risks\n(Bullet points of main risks)\n\n\
         ### Morning Plan\n(Activity, protection and diet advice for the morning)\n\n\
         ### Afternoon Plan\n(Work/school exposure, hydration and indoor air advice)\n\n\
         ### Evening Plan\n(Sleep hygiene, ventilation and recovery advice)\n",
        aqi = env.aqi,
        tier = tier,
        temp = fmt_opt(&env.temperature),
        humidity = fmt_opt(&env.humidity),
        condition = fmt_opt(&env.description),
        city = fmt_opt(&env.city),
        pollutants = env.pollutants,
    )
}

fn emergency_prompt(city: &str, country: &str) -> String {
    // ---
    format!(
        "**Task:**\n\
         Provide the emergency contact numbers for **{city}, {country}**.\n\n\
         **Required Output Format (JSON):**\n\
         {{\"ambulance\": \"Phone Number\", \"police\": \"Phone Number\", \
         \"general\": \"Phone Number (e.g. 911, 112)\", \
         \"notes\": \"Brief 1-sentence advice specific to this location.\"}}\n\n\
         **Constraints:**\n\
         - Return ONLY valid JSON.\n\
         - If specific city numbers aren't found, use National numbers for {country}.\n"
    )
}

/// Pull the advice text out of a trigger response.
///
/// The studio puts it at `output.transformed.advice`, older tools at
/// `output.advice`. Object answers are re-serialised so the caller can parse them.
fn extract_advice(data: &Value) -> Option<String> {
    // ---
    let output = data.get("output")?;
    let advice = output
        .get("transformed")
        .and_then(|t| t.get("advice"))
        .filter(|a| !a.is_null())
        .or_else(|| output.get("advice"))?;

    match advice {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(_) => Some(advice.to_string()),
        _ => None,
    }
}

/// Advisory oracle backed by a Relevance AI studio.
#[derive(Clone)]
pub struct RelevanceOracle {
    client: Client,
    config: RelevanceConfig,
}

impl RelevanceOracle {
    pub fn new(client: Client, config: RelevanceConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://api-{}.stack.tryrelevance.com/latest/studios/{}/trigger",
            self.config.region, self.config.tool_id
        )
    }

    async fn trigger(&self, prompt: String) -> Result<String> {
        // ---
        let payload = json!({
            "params": { "prompt": prompt },
            "project": self.config.project,
        });
        let request = self
            .client
            .post(self.endpoint())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("{}:{}", self.config.project, self.config.api_key),
            )
            .json(&payload)
            .timeout(TIMEOUT);

        let data: Value = send_json(request).await?;
        debug!("Advisory oracle answered");

        extract_advice(&data).ok_or_else(|| anyhow!("Advisory response had no advice field"))
    }
}

#[async_trait]
impl AdvisoryOracle for RelevanceOracle {
    async fn assess(&self, env: &EnvironmentSnapshot) -> Result<HealthAnalysis> {
        let advice = self.trigger(health_prompt(env)).await?;
        Ok(HealthAnalysis::parse(&advice))
    }

    async fn emergency_contacts(&self, city: &str, country: &str) -> Result<EmergencyContacts> {
        // ---
        let answer = self.trigger(emergency_prompt(city, country)).await?;
        serde_json::from_str(strip_code_fence(&answer))
            .with_context(|| format!("Emergency contacts for {}, {} were not valid JSON", city, country))
    }
}

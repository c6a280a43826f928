//! Rule-based daily plan generation.
//!
//! A plan is a pure function of an AQI value, an optional upstream fire
//! signal and an optional oracle analysis. Every ladder below is an ordered
//! cascade of strict `>` thresholds with a total `else` branch, so any
//! integer (negative included) yields a complete plan.

use serde::Serialize;

use crate::models::{ForecastAnalysis, ForecastDay, HealthAnalysis};

// ---

/// Smoke must be predicted to arrive sooner than this to trigger the override.
const SMOKE_OVERRIDE_HOURS: f64 = 12.0;

/// Assumed smoke arrival when the analysis does not say.
const DEFAULT_SMOKE_ARRIVAL_HOURS: f64 = 24.0;

/// Breathlessness scores above this trigger inhaler reminders.
const BREATHLESSNESS_THRESHOLD: f64 = 6.0;

/// Threshold variants for hydration targets and the narrative risk switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieringPolicy {
    /// Hydration 2000/2500/3000 ml; narrative high risk above 200.
    #[default]
    Standard,
    /// Hydration 2500/3000/3500 ml; narrative high risk above 150.
    Extended,
}

impl TieringPolicy {
    pub fn hydration_ml(self, aqi: i32) -> u32 {
        // ---
        match self {
            TieringPolicy::Standard => {
                if aqi > 200 {
                    3000
                } else if aqi > 150 {
                    2500
                } else {
                    2000
                }
            }
            TieringPolicy::Extended => {
                if aqi > 200 {
                    3500
                } else if aqi > 150 {
                    3000
                } else {
                    2500
                }
            }
        }
    }

    pub fn risk_category(self, aqi: i32) -> RiskCategory {
        // ---
        let high_above = match self {
            TieringPolicy::Standard => 200,
            TieringPolicy::Extended => 150,
        };

        if aqi > high_above {
            RiskCategory::High
        } else if aqi > 100 {
            RiskCategory::Moderate
        } else {
            RiskCategory::Low
        }
    }
}

/// Coarse bucket used to pick narrative text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    fn heading(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning plan",
            TimeOfDay::Afternoon => "afternoon plan",
            TimeOfDay::Evening => "evening plan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskPriority {
    None,
    Low,
    Medium,
    High,
    Critical,
}

/// Actionable recommendations for one day, built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPlan {
    pub mask_level: &'static str,
    pub mask_priority: MaskPriority,
    pub outdoor_restriction: &'static str,
    pub outdoor_allowed: bool,
    pub hydration_ml: u32,
    pub purifier_recommendations: Vec<&'static str>,
    pub inhaler_reminders: Vec<&'static str>,
    pub smoke_actions: Vec<String>,
    pub morning_plan: String,
    pub afternoon_plan: String,
    pub evening_plan: String,
    pub crisis_mode: bool,
}

// Canned narrative, indexed by time of day then risk category.

const MORNING_LOW: &[&str] = &[
    "✅ **Activity**: The air is relatively clean. It's a great time for an outdoor run or cycling session (6-8 AM).",
    "🥗 **Diet**: Start your day with a light, antioxidant-rich breakfast (berries, nuts).",
    "🏠 **Home**: Open windows to ventilate your home.",
];
const MORNING_MODERATE: &[&str] = &[
    "⚠️ **Activity**: Limit intense outdoor cardio to 30 minutes. Prefer brisk walking.",
    "😷 **Protection**: Carry a mask. Wear it if you feel irritation.",
    "🥗 **Diet**: Drink warm water with lemon and honey.",
];
const MORNING_HIGH: &[&str] = &[
    "🚫 **Activity**: **SKIP outdoor exercise.** Switch to indoor yoga or home workouts.",
    "😷 **Protection**: **N95 mask is mandatory** if outdoors.",
    "💊 **Health**: Keep preventive inhaler handy if asthmatic.",
    "🥗 **Diet**: Consume Turmeric milk (Haldi Doodh) and Vitamin C rich foods.",
];
const AFTERNOON_LOW: &[&str] = &[
    "✅ **Activity**: Normal outdoor activities allowed.",
    "💧 **Hydration**: Aim for 2-3 liters of water throughout the day.",
];
const AFTERNOON_MODERATE: &[&str] = &[
    "⚠️ **Activity**: Avoid strenuous labor outdoors.",
    "🏠 **Home**: Keep windows closed during peak traffic (4-7 PM).",
    "💧 **Hydration**: Drink water every hour.",
];
const AFTERNOON_HIGH: &[&str] = &[
    "🚫 **Activity**: **STAY INDOORS.** Avoid outdoor lunch breaks.",
    "🏠 **Home**: Run air purifier on **MAX**. Seal gaps under doors.",
    "🥗 **Diet**: Eat light meals (Salads, Soups).",
    "🚗 **Commute**: Use 'Recirculate' mode in car AC.",
];
const EVENING_LOW: &[&str] = &[
    "✅ **Activity**: Evening walk in the park is safe.",
    "🏠 **Home**: Ventilate bedroom before sleeping.",
];
const EVENING_MODERATE: &[&str] = &[
    "⚠️ **Activity**: Limit to a short walk. Avoid busy roads.",
    "🏠 **Home**: Run air purifier in bedroom for 1 hour before sleep.",
];
const EVENING_HIGH: &[&str] = &[
    "🚫 **Activity**: **No evening walks.** Pollution settles low at night.",
    "🏠 **Home**: Keep bedroom windows **sealed**. Air purifier ON.",
    "🚿 **Hygiene**: Wash face/hands immediately after returning home.",
    "🍵 **Diet**: Drink warm Ginger tea or soup.",
];

/// Canned narrative lines for a time of day and risk category.
pub fn time_plan(time: TimeOfDay, risk: RiskCategory) -> &'static [&'static str] {
    // ---
    match (time, risk) {
        (TimeOfDay::Morning, RiskCategory::Low) => MORNING_LOW,
        (TimeOfDay::Morning, RiskCategory::Moderate) => MORNING_MODERATE,
        (TimeOfDay::Morning, RiskCategory::High) => MORNING_HIGH,
        (TimeOfDay::Afternoon, RiskCategory::Low) => AFTERNOON_LOW,
        (TimeOfDay::Afternoon, RiskCategory::Moderate) => AFTERNOON_MODERATE,
        (TimeOfDay::Afternoon, RiskCategory::High) => AFTERNOON_HIGH,
        (TimeOfDay::Evening, RiskCategory::Low) => EVENING_LOW,
        (TimeOfDay::Evening, RiskCategory::Moderate) => EVENING_MODERATE,
        (TimeOfDay::Evening, RiskCategory::High) => EVENING_HIGH,
    }
}

fn mask_for(aqi: i32) -> (&'static str, MaskPriority) {
    // ---
    if aqi > 300 {
        ("N95 Mandatory", MaskPriority::Critical)
    } else if aqi > 200 {
        ("N95 Recommended", MaskPriority::High)
    } else if aqi > 150 {
        ("N95/KN95", MaskPriority::Medium)
    } else if aqi > 100 {
        ("Surgical/Sensitive", MaskPriority::Low)
    } else {
        ("Optional", MaskPriority::None)
    }
}

fn outdoor_for(aqi: i32) -> (&'static str, bool) {
    // ---
    if aqi > 300 {
        ("Complete restriction - Stay indoors", false)
    } else if aqi > 200 {
        ("Severe restriction - Only essential outdoor activities", false)
    } else if aqi > 150 {
        ("Moderate restriction - Limit outdoor time to 30 minutes", true)
    } else if aqi > 100 {
        ("Sensitive groups should limit outdoor time", true)
    } else {
        ("Normal outdoor activities allowed", true)
    }
}

fn purifier_for(aqi: i32) -> Vec<&'static str> {
    // ---
    if aqi > 150 {
        vec!["Run air purifier continuously", "Keep windows closed"]
    } else if aqi > 100 {
        vec![
            "Run air purifier during peak hours (10 AM - 6 PM)",
            "Close windows during high traffic hours",
        ]
    } else {
        vec![
            "Run air purifier 2-3 hours daily",
            "Ventilate during low pollution hours",
        ]
    }
}

/// Respiratory risk level used for inhaler reminders when the oracle gave none.
fn derived_risk_level(aqi: i32) -> &'static str {
    if aqi > 250 {
        "severe"
    } else if aqi > 150 {
        "high"
    } else {
        "moderate"
    }
}

fn inhaler_for(aqi: i32, analysis: Option<&HealthAnalysis>) -> Vec<&'static str> {
    // ---
    let structured = match analysis {
        Some(HealthAnalysis::Structured(s)) => Some(s),
        _ => None,
    };

    let risk_level = structured
        .and_then(|s| s.risk_level.as_deref())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| derived_risk_level(aqi).to_string());
    let breathlessness = structured.and_then(|s| s.breathlessness_risk).unwrap_or(0.0);

    if matches!(risk_level.as_str(), "high" | "severe") || breathlessness > BREATHLESSNESS_THRESHOLD {
        vec![
            "Morning: Use preventive inhaler before going out",
            "Evening: Keep rescue inhaler accessible",
        ]
    } else {
        Vec::new()
    }
}

/// Fixed mitigation sequence when fires are active and smoke is close.
fn smoke_actions_for(fire_count: u32, analysis: Option<&HealthAnalysis>) -> Vec<String> {
    // ---
    let arrival = match analysis {
        Some(HealthAnalysis::Structured(s)) => s.smoke_arrival_hours,
        _ => None,
    }
    .filter(|h| h.is_finite())
    .unwrap_or(DEFAULT_SMOKE_ARRIVAL_HOURS);

    if fire_count == 0 || arrival >= SMOKE_OVERRIDE_HOURS {
        return Vec::new();
    }

    vec![
        format!("⚠️ Stubble smoke arriving in {} hours", arrival),
        "Seal all windows and doors".to_string(),
        "Run air purifier at maximum".to_string(),
        "Avoid outdoor activities".to_string(),
        "Use N95 mask if going out is necessary".to_string(),
    ]
}

/// Extract the body of a markdown section such as `### 🌅 Morning Plan`.
///
/// Heading depth and leading decorations are ignored, and the heading only
/// has to start with `heading` (so `Morning Plan (6-10 AM)` matches). The
/// body runs until the next heading. Returns `None` when the section is
/// absent or empty.
pub fn extract_section(markdown: &str, heading: &str) -> Option<String> {
    // ---
    let mut lines = markdown.lines();
    let mut body = Vec::new();

    for line in lines.by_ref() {
        if heading_text(line).is_some_and(|text| starts_with_ignore_case(&text, heading)) {
            break;
        }
    }
    for line in lines {
        if heading_text(line).is_some() {
            break;
        }
        body.push(line);
    }

    let text = body.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Normalised text of a markdown heading line, or `None` for ordinary lines.
fn heading_text(line: &str) -> Option<String> {
    // ---
    let rest = line.trim_start().strip_prefix('#')?;
    let text = rest
        .trim_start_matches('#')
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end_matches(|c: char| c == '#' || c == ':' || c.is_whitespace());
    Some(text.to_string())
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn oracle_section(analysis: Option<&HealthAnalysis>, time: TimeOfDay) -> Option<String> {
    // ---
    match analysis? {
        HealthAnalysis::RawText(text) => extract_section(text, time.heading()),
        HealthAnalysis::Structured(s) => {
            let field = match time {
                TimeOfDay::Morning => &s.morning_plan,
                TimeOfDay::Afternoon => &s.afternoon_plan,
                TimeOfDay::Evening => &s.evening_plan,
            };
            field
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
        }
    }
}

/// Plan generator bound to one tiering policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Planner {
    policy: TieringPolicy,
}

impl Planner {
    pub fn new(policy: TieringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TieringPolicy {
        self.policy
    }

    /// Build a plan. Oracle sections replace the canned narrative only when
    /// present and non-empty.
    pub fn generate(&self, aqi: i32, fire_count: u32, analysis: Option<&HealthAnalysis>) -> DailyPlan {
        // ---
        let (mask_level, mask_priority) = mask_for(aqi);
        let (outdoor_restriction, outdoor_allowed) = outdoor_for(aqi);
        let risk = self.policy.risk_category(aqi);

        let narrative = |time: TimeOfDay| {
            oracle_section(analysis, time).unwrap_or_else(|| time_plan(time, risk).join("\n"))
        };

        DailyPlan {
            mask_level,
            mask_priority,
            outdoor_restriction,
            outdoor_allowed,
            hydration_ml: self.policy.hydration_ml(aqi),
            purifier_recommendations: purifier_for(aqi),
            inhaler_reminders: inhaler_for(aqi, analysis),
            smoke_actions: smoke_actions_for(fire_count, analysis),
            morning_plan: narrative(TimeOfDay::Morning),
            afternoon_plan: narrative(TimeOfDay::Afternoon),
            evening_plan: narrative(TimeOfDay::Evening),
            crisis_mode: aqi > 400,
        }
    }
}

/// Generate a plan with the standard policy.
pub fn generate_plan(aqi: i32, fire_count: u32, analysis: Option<&HealthAnalysis>) -> DailyPlan {
    Planner::default().generate(aqi, fire_count, analysis)
}

/// Pick the best (lowest) and worst (highest) day of a forecast.
///
/// Ties go to the earliest day. An empty forecast yields "N/A" days with AQI 0.
pub fn analyze_forecast(days: &[ForecastDay]) -> ForecastAnalysis {
    // ---
    let label = |d: &ForecastDay| format!("{} ({})", d.day, d.date);

    let best = days.iter().reduce(|a, b| if b.max_aqi < a.max_aqi { b } else { a });
    let worst = days.iter().reduce(|a, b| if b.max_aqi > a.max_aqi { b } else { a });

    match (best, worst) {
        (Some(best), Some(worst)) => ForecastAnalysis {
            best_day: label(best),
            best_aqi: best.max_aqi,
            worst_day: label(worst),
            worst_aqi: worst.max_aqi,
        },
        _ => ForecastAnalysis {
            best_day: "N/A".to_string(),
            best_aqi: 0,
            worst_day: "N/A".to_string(),
            worst_aqi: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::StructuredAnalysis;

    const EVERY_TIER: [i32; 9] = [-20, 0, 50, 101, 151, 201, 301, 401, 999];

    fn structured(f: impl FnOnce(&mut StructuredAnalysis)) -> HealthAnalysis {
        // ---
        let mut s = StructuredAnalysis {
            assessment: "Assessment".to_string(),
            ..Default::default()
        };
        f(&mut s);
        HealthAnalysis::Structured(s)
    }

    #[test]
    fn test_mask_ladder_is_exclusive() {
        // ---
        assert_eq!(generate_plan(301, 0, None).mask_level, "N95 Mandatory");
        assert_ne!(generate_plan(300, 0, None).mask_level, "N95 Mandatory");
        assert_eq!(generate_plan(300, 0, None).mask_level, "N95 Recommended");
        assert_eq!(generate_plan(200, 0, None).mask_level, "N95/KN95");
        assert_eq!(generate_plan(150, 0, None).mask_level, "Surgical/Sensitive");
        assert_eq!(generate_plan(100, 0, None).mask_level, "Optional");
        assert_eq!(generate_plan(100, 0, None).mask_priority, MaskPriority::None);
        assert_eq!(generate_plan(301, 0, None).mask_priority, MaskPriority::Critical);
    }

    #[test]
    fn test_crisis_mode_boundary() {
        assert!(generate_plan(401, 0, None).crisis_mode);
        assert!(!generate_plan(400, 0, None).crisis_mode);
    }

    #[test]
    fn test_outdoor_restrictions() {
        // ---
        let plan = generate_plan(301, 0, None);
        assert!(!plan.outdoor_allowed);
        assert_eq!(plan.outdoor_restriction, "Complete restriction - Stay indoors");

        let plan = generate_plan(201, 0, None);
        assert!(!plan.outdoor_allowed);

        let plan = generate_plan(200, 0, None);
        assert!(plan.outdoor_allowed);
        assert_eq!(
            plan.outdoor_restriction,
            "Moderate restriction - Limit outdoor time to 30 minutes"
        );
    }

    #[test]
    fn test_hydration_policies() {
        // ---
        let standard = Planner::new(TieringPolicy::Standard);
        let extended = Planner::new(TieringPolicy::Extended);

        assert_eq!(standard.generate(201, 0, None).hydration_ml, 3000);
        assert_eq!(standard.generate(151, 0, None).hydration_ml, 2500);
        assert_eq!(standard.generate(150, 0, None).hydration_ml, 2000);

        assert_eq!(extended.generate(201, 0, None).hydration_ml, 3500);
        assert_eq!(extended.generate(151, 0, None).hydration_ml, 3000);
        assert_eq!(extended.generate(150, 0, None).hydration_ml, 2500);
    }

    #[test]
    fn test_risk_category_policies_differ() {
        // ---
        assert_eq!(TieringPolicy::Standard.risk_category(180), RiskCategory::Moderate);
        assert_eq!(TieringPolicy::Extended.risk_category(180), RiskCategory::High);
        assert_eq!(TieringPolicy::Standard.risk_category(201), RiskCategory::High);
        assert_eq!(TieringPolicy::Standard.risk_category(100), RiskCategory::Low);
        assert_eq!(TieringPolicy::Extended.risk_category(101), RiskCategory::Moderate);
    }

    #[test]
    fn test_purifier_guidance() {
        // ---
        assert_eq!(generate_plan(151, 0, None).purifier_recommendations[0], "Run air purifier continuously");
        assert!(generate_plan(101, 0, None).purifier_recommendations[0].contains("peak hours"));
        assert_eq!(generate_plan(20, 0, None).purifier_recommendations[0], "Run air purifier 2-3 hours daily");
    }

    #[test]
    fn test_canned_narrative_follows_risk_category() {
        // ---
        let plan = generate_plan(250, 0, None);
        assert_eq!(plan.morning_plan, MORNING_HIGH.join("\n"));
        assert_eq!(plan.afternoon_plan, AFTERNOON_HIGH.join("\n"));
        assert_eq!(plan.evening_plan, EVENING_HIGH.join("\n"));

        let plan = generate_plan(120, 0, None);
        assert_eq!(plan.morning_plan, MORNING_MODERATE.join("\n"));

        let plan = generate_plan(10, 0, None);
        assert_eq!(plan.evening_plan, EVENING_LOW.join("\n"));
    }

    #[test]
    fn test_fallback_never_empty() {
        // ---
        let malformed = [
            None,
            Some(HealthAnalysis::RawText(String::new())),
            Some(HealthAnalysis::RawText("Health advice unavailable".to_string())),
            Some(HealthAnalysis::RawText("### Morning Plan\n\n### Evening Plan\n".to_string())),
            Some(structured(|s| s.morning_plan = Some("   ".to_string()))),
        ];

        for aqi in EVERY_TIER {
            for analysis in &malformed {
                for policy in [TieringPolicy::Standard, TieringPolicy::Extended] {
                    let plan = Planner::new(policy).generate(aqi, 0, analysis.as_ref());
                    assert!(!plan.morning_plan.is_empty(), "empty morning at {aqi}");
                    assert!(!plan.afternoon_plan.is_empty(), "empty afternoon at {aqi}");
                    assert!(!plan.evening_plan.is_empty(), "empty evening at {aqi}");
                    assert!(!plan.purifier_recommendations.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_markdown_sections_replace_canned_text() {
        // ---
        let advice = "### 📊 Executive Summary\nBad air.\n\n\
                      ### 🌅 Morning Plan\n- Stay in\n- Close windows\n\n\
                      ### ☀️ Afternoon Plan\n- Hydrate\n\n\
                      ### 🌙 Evening Plan\n- Purifier on\n";
        let analysis = HealthAnalysis::RawText(advice.to_string());
        let plan = generate_plan(180, 0, Some(&analysis));

        assert_eq!(plan.morning_plan, "- Stay in\n- Close windows");
        assert_eq!(plan.afternoon_plan, "- Hydrate");
        assert_eq!(plan.evening_plan, "- Purifier on");
    }

    #[test]
    fn test_partial_markdown_mixes_with_canned_text() {
        // ---
        let analysis = HealthAnalysis::RawText("## morning plan:\nWalk early.".to_string());
        let plan = generate_plan(50, 0, Some(&analysis));

        assert_eq!(plan.morning_plan, "Walk early.");
        assert_eq!(plan.afternoon_plan, AFTERNOON_LOW.join("\n"));
    }

    #[test]
    fn test_headings_with_suffix_still_match() {
        // ---
        let advice = "### Morning Plan (6-10 AM)\n- Indoor yoga\n### Afternoon Plan for Delhi\n- Rest";
        let analysis = HealthAnalysis::RawText(advice.to_string());
        let plan = generate_plan(250, 0, Some(&analysis));

        assert_eq!(plan.morning_plan, "- Indoor yoga");
        assert_eq!(plan.afternoon_plan, "- Rest");
        assert_eq!(plan.evening_plan, EVENING_HIGH.join("\n"));
    }

    #[test]
    fn test_structured_sections_replace_canned_text() {
        // ---
        let analysis = structured(|s| {
            s.morning_plan = Some("Indoor yoga".to_string());
            s.evening_plan = Some("Seal windows".to_string());
        });
        let plan = generate_plan(320, 0, Some(&analysis));

        assert_eq!(plan.morning_plan, "Indoor yoga");
        assert_eq!(plan.afternoon_plan, AFTERNOON_HIGH.join("\n"));
        assert_eq!(plan.evening_plan, "Seal windows");
    }

    #[test]
    fn test_smoke_override_ignores_aqi() {
        // ---
        let analysis = structured(|s| s.smoke_arrival_hours = Some(6.0));

        for aqi in EVERY_TIER {
            let plan = generate_plan(aqi, 1, Some(&analysis));
            assert_eq!(plan.smoke_actions.len(), 5);
            assert!(plan.smoke_actions[0].contains("6 hours"));
            assert!(plan.smoke_actions.contains(&"Seal all windows and doors".to_string()));
            assert!(plan.smoke_actions.contains(&"Run air purifier at maximum".to_string()));
            assert!(plan.smoke_actions.contains(&"Avoid outdoor activities".to_string()));
        }
    }

    #[test]
    fn test_smoke_override_requires_fire_and_near_arrival() {
        // ---
        let near = structured(|s| s.smoke_arrival_hours = Some(6.0));
        let far = structured(|s| s.smoke_arrival_hours = Some(12.0));

        assert!(generate_plan(100, 0, Some(&near)).smoke_actions.is_empty());
        assert!(generate_plan(100, 3, Some(&far)).smoke_actions.is_empty());
        // Without an arrival estimate the default of 24 hours applies
        assert!(generate_plan(100, 3, None).smoke_actions.is_empty());
    }

    #[test]
    fn test_inhaler_reminders() {
        // ---
        assert!(generate_plan(150, 0, None).inhaler_reminders.is_empty());
        assert_eq!(generate_plan(151, 0, None).inhaler_reminders.len(), 2);

        let calm = structured(|s| s.risk_level = Some("low".to_string()));
        assert!(generate_plan(300, 0, Some(&calm)).inhaler_reminders.is_empty());

        let severe = structured(|s| s.risk_level = Some("Severe".to_string()));
        assert_eq!(generate_plan(10, 0, Some(&severe)).inhaler_reminders.len(), 2);

        let breathless = structured(|s| s.breathlessness_risk = Some(7.0));
        assert_eq!(generate_plan(10, 0, Some(&breathless)).inhaler_reminders.len(), 2);
    }

    #[test]
    fn test_extract_section() {
        // ---
        let md = "# Morning Plan\nline one\nline two\n# Afternoon Plan\nother";
        assert_eq!(extract_section(md, "morning plan").as_deref(), Some("line one\nline two"));
        assert_eq!(extract_section(md, "afternoon plan").as_deref(), Some("other"));
        assert_eq!(extract_section(md, "evening plan"), None);
        assert_eq!(extract_section("no headings here", "morning plan"), None);
    }

    fn day(day: &str, date: &str, max_aqi: u16) -> ForecastDay {
        ForecastDay {
            day: day.to_string(),
            date: date.to_string(),
            max_aqi,
        }
    }

    #[test]
    fn test_analyze_forecast() {
        // ---
        let days = vec![
            day("Mon", "2025-01-06", 120),
            day("Tue", "2025-01-07", 80),
            day("Wed", "2025-01-08", 250),
            day("Thu", "2025-01-09", 80),
        ];
        let analysis = analyze_forecast(&days);

        assert_eq!(analysis.best_day, "Tue (2025-01-07)");
        assert_eq!(analysis.best_aqi, 80);
        assert_eq!(analysis.worst_day, "Wed (2025-01-08)");
        assert_eq!(analysis.worst_aqi, 250);
    }

    #[test]
    fn test_analyze_empty_forecast() {
        // ---
        let analysis = analyze_forecast(&[]);
        assert_eq!(analysis.best_day, "N/A");
        assert_eq!(analysis.worst_day, "N/A");
        assert_eq!(analysis.best_aqi, 0);
        assert_eq!(analysis.worst_aqi, 0);
    }
}

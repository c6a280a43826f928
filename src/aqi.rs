//! US EPA Air Quality Index derivation.
//!
//! Everything in here is pure: PM2.5 breakpoint interpolation, the coarse
//! provider-index remap, the cigarette-equivalent exposure estimate and the
//! risk tier ladder. Callers decide which AQI path applies to their data;
//! the PM2.5 formula and the provider-index remap are deliberately kept as
//! separate functions because they do not agree with each other.

use serde::Serialize;

// ---

/// Highest value on the AQI scale. Concentrations beyond the last breakpoint
/// saturate here.
pub const AQI_MAX: u16 = 500;

/// One PM2.5 band: concentration bounds (µg/m³) and the AQI bounds they map to.
#[derive(Debug, Clone, Copy)]
struct Breakpoint {
    c_lo: f64,
    c_hi: f64,
    i_lo: f64,
    i_hi: f64,
}

const fn bp(c_lo: f64, c_hi: f64, i_lo: f64, i_hi: f64) -> Breakpoint {
    Breakpoint { c_lo, c_hi, i_lo, i_hi }
}

/// EPA PM2.5 breakpoint table, ordered by concentration.
const PM25_BREAKPOINTS: [Breakpoint; 7] = [
    bp(0.0, 12.0, 0.0, 50.0),
    bp(12.1, 35.4, 51.0, 100.0),
    bp(35.5, 55.4, 101.0, 150.0),
    bp(55.5, 150.4, 151.0, 200.0),
    bp(150.5, 250.4, 201.0, 300.0),
    bp(250.5, 350.4, 301.0, 400.0),
    bp(350.5, 500.4, 401.0, 500.0),
];

/// Cigarettes per day equivalent to 22 µg/m³ of PM2.5 (Berkeley Earth rule of thumb).
const PM25_PER_CIGARETTE: f64 = 22.0;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Convert a PM2.5 concentration (µg/m³) into an AQI value in `0..=500`.
///
/// The concentration is rounded to one decimal place and interpolated
/// linearly inside its EPA band:
///
/// ```text
/// AQI = round((Ihi - Ilo) / (Chi - Clo) * (c - Clo) + Ilo)
/// ```
///
/// Negative or non-finite input is treated as zero. Anything above the top
/// breakpoint (500.4) saturates at [`AQI_MAX`].
pub fn aqi_from_pm25(concentration: f64) -> u16 {
    // ---
    let c = if concentration.is_finite() && concentration > 0.0 {
        round1(concentration)
    } else if concentration == f64::INFINITY {
        return AQI_MAX;
    } else {
        0.0
    };

    PM25_BREAKPOINTS
        .iter()
        .find(|band| c <= band.c_hi)
        .map(|band| {
            let aqi = (band.i_hi - band.i_lo) / (band.c_hi - band.c_lo) * (c - band.c_lo) + band.i_lo;
            aqi.round().clamp(0.0, AQI_MAX as f64) as u16
        })
        .unwrap_or(AQI_MAX)
}

/// Cigarette-equivalent daily exposure for a PM2.5 concentration.
///
/// Uses the raw concentration, not the AQI scale. Non-positive input yields 0.
pub fn cigarette_equivalent(concentration: f64) -> f64 {
    // ---
    if concentration.is_nan() || concentration <= 0.0 {
        return 0.0;
    }
    round1(concentration / PM25_PER_CIGARETTE)
}

/// Remap a coarse 1–5 provider index (OpenWeatherMap style) onto the AQI scale.
///
/// This is a lookup, not an interpolation, and is much coarser than
/// [`aqi_from_pm25`]. Unknown indices map to 50.
pub fn aqi_from_provider_index(index: u8) -> u16 {
    // ---
    match index {
        1 => 40,
        2 => 80,
        3 => 120,
        4 => 180,
        5 => 250,
        _ => 50,
    }
}

/// Qualitative AQI bucket.
///
/// This is the single category table used for labelling (the plan ladders in
/// `planner` keep their own thresholds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl RiskTier {
    /// Classify an AQI value using strict `>` thresholds, highest first.
    pub fn from_aqi(aqi: i32) -> Self {
        // ---
        if aqi > 300 {
            RiskTier::Hazardous
        } else if aqi > 200 {
            RiskTier::VeryUnhealthy
        } else if aqi > 150 {
            RiskTier::Unhealthy
        } else if aqi > 100 {
            RiskTier::UnhealthyForSensitiveGroups
        } else if aqi > 50 {
            RiskTier::Moderate
        } else {
            RiskTier::Good
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Good => "Good",
            RiskTier::Moderate => "Moderate",
            RiskTier::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            RiskTier::Unhealthy => "Unhealthy",
            RiskTier::VeryUnhealthy => "Very Unhealthy",
            RiskTier::Hazardous => "Hazardous",
        }
    }
}

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two `(lat, lon)` points.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    // ---
    let (lat1, lon1) = a;
    let (lat2, lon2) = b;
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

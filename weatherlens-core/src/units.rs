//! Unit conversions and fixed classifications.
//!
//! Everything here is pure and synchronous. The provider adapter calls these
//! exactly once at the boundary so the rest of the crate only ever sees
//! dashboard units (°C, km/h, km, percent).

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Round half-way values toward positive infinity (2.5 -> 3, -2.5 -> -2).
pub fn round_half_up(value: f64) -> i32 {
    // `value + 0.5` can itself round up, e.g. for 0.49999999999999994.
    let nearest = value.round();
    if value - nearest == 0.5 {
        (nearest + 1.0) as i32
    } else {
        nearest as i32
    }
}

fn round_non_negative(value: f64) -> u32 {
    round_half_up(value).max(0) as u32
}

/// Metres per second to whole kilometres per hour.
pub fn mps_to_kmh(speed_mps: f64) -> u32 {
    round_non_negative(speed_mps * 3.6)
}

/// Metres to whole kilometres.
pub fn meters_to_km(meters: f64) -> u32 {
    round_non_negative(meters / 1000.0)
}

/// Fraction in 0.0..=1.0 to a whole percentage, clamped to 0..=100.
pub fn fraction_to_pct(fraction: f64) -> u8 {
    round_half_up(fraction * 100.0).clamp(0, 100) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompassPoint {
    N,
    Nne,
    Ne,
    Ene,
    E,
    Ese,
    Se,
    Sse,
    S,
    Ssw,
    Sw,
    Wsw,
    W,
    Wnw,
    Nw,
    Nnw,
}

impl CompassPoint {
    const ALL: [CompassPoint; 16] = [
        CompassPoint::N,
        CompassPoint::Nne,
        CompassPoint::Ne,
        CompassPoint::Ene,
        CompassPoint::E,
        CompassPoint::Ese,
        CompassPoint::Se,
        CompassPoint::Sse,
        CompassPoint::S,
        CompassPoint::Ssw,
        CompassPoint::Sw,
        CompassPoint::Wsw,
        CompassPoint::W,
        CompassPoint::Wnw,
        CompassPoint::Nw,
        CompassPoint::Nnw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::Nne => "NNE",
            CompassPoint::Ne => "NE",
            CompassPoint::Ene => "ENE",
            CompassPoint::E => "E",
            CompassPoint::Ese => "ESE",
            CompassPoint::Se => "SE",
            CompassPoint::Sse => "SSE",
            CompassPoint::S => "S",
            CompassPoint::Ssw => "SSW",
            CompassPoint::Sw => "SW",
            CompassPoint::Wsw => "WSW",
            CompassPoint::W => "W",
            CompassPoint::Wnw => "WNW",
            CompassPoint::Nw => "NW",
            CompassPoint::Nnw => "NNW",
        }
    }
}

impl std::fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nearest of the 16 compass points for a wind bearing in degrees.
pub fn compass_direction(degrees: f64) -> CompassPoint {
    let sector = round_half_up(degrees / 22.5) as i64;
    CompassPoint::ALL[sector.rem_euclid(16) as usize]
}

/// Health category for the provider's 1..=5 air quality index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    /// Anything outside 1..=5 is treated as the most severe category.
    pub fn from_index(index: i64) -> Self {
        match index {
            1 => AqiCategory::Good,
            2 => AqiCategory::Moderate,
            3 => AqiCategory::UnhealthyForSensitiveGroups,
            4 => AqiCategory::Unhealthy,
            5 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AqiCategory::Good => "aqi-good",
            AqiCategory::Moderate => "aqi-moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "aqi-unhealthy-sensitive",
            AqiCategory::Unhealthy => "aqi-unhealthy",
            AqiCategory::VeryUnhealthy => "aqi-very-unhealthy",
            AqiCategory::Hazardous => "aqi-hazardous",
        }
    }

    pub fn health_message(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Air quality is excellent. Safe for all outdoor activities.",
            AqiCategory::Moderate => {
                "Air quality is acceptable. Sensitive individuals should limit prolonged outdoor exposure."
            }
            AqiCategory::UnhealthyForSensitiveGroups => {
                "Sensitive groups should reduce outdoor activity. Consider wearing a mask outdoors."
            }
            AqiCategory::Unhealthy => {
                "Everyone may experience health effects. Limit outdoor exposure and wear a mask."
            }
            AqiCategory::VeryUnhealthy => {
                "Health alert! Avoid all outdoor activities. Stay indoors with air filtration."
            }
            AqiCategory::Hazardous => {
                "Emergency conditions! Everyone should avoid all outdoor activities."
            }
        }
    }

    /// Good and Moderate air is fine for outdoor activity.
    pub fn is_outdoor_friendly(&self) -> bool {
        matches!(self, AqiCategory::Good | AqiCategory::Moderate)
    }
}

/// Rough position on the 0..500 US AQI scale, for display only.
pub fn approximate_us_aqi(index: i64) -> i64 {
    const RANGES: [i64; 6] = [0, 50, 100, 150, 200, 300];
    usize::try_from(index)
        .ok()
        .and_then(|i| RANGES.get(i).copied())
        .unwrap_or(index)
}

fn to_zone<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(tz))
}

/// "07:42 AM"-style clock time.
pub fn format_time<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    to_zone(timestamp, tz)
        .map(|dt| dt.format("%I:%M %p").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// "Mon, Jan 5"-style date.
pub fn format_date<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    to_zone(timestamp, tz)
        .map(|dt| dt.format("%a, %b %-d").to_string())
        .unwrap_or_default()
}

/// "Today", "Tomorrow", or the short weekday name.
pub fn day_name<Tz: TimeZone>(timestamp: i64, today: NaiveDate, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(dt) = to_zone(timestamp, tz) else {
        return String::new();
    };

    let date = dt.date_naive();
    if date == today {
        "Today".to_string()
    } else if Some(date) == today.succ_opt() {
        "Tomorrow".to_string()
    } else {
        dt.format("%a").to_string()
    }
}

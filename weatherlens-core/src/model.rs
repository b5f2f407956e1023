use serde::{Deserialize, Serialize};

use crate::units::{AqiCategory, CompassPoint};

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// The place a snapshot describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    /// ISO 3166 country code as reported by the provider.
    pub country: String,
    pub coordinates: Coordinates,
}

/// Current conditions, already converted to dashboard units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: i32,
    pub feels_like_c: i32,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    /// `None` when the provider omits visibility.
    pub visibility_km: Option<u32>,
    pub wind_speed_kmh: u32,
    pub wind_degrees: u16,
    pub wind_direction: CompassPoint,
    /// Short category, e.g. "Rain" or "Clear".
    pub condition: String,
    pub description: String,
    pub icon: String,
    /// `None` when the UV endpoint could not be reached.
    pub uv_index: Option<f64>,
    pub cloud_cover_pct: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: i64,
    pub sunset: i64,
}

/// One complete reading of current weather for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub current: CurrentConditions,
    pub sun: SunTimes,
    /// Provider observation time (Unix seconds), not the fetch time.
    pub observed_at: i64,
}

/// Pollutant concentrations in µg/m³.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PollutantComponents {
    #[serde(default)]
    pub co: f64,
    #[serde(default)]
    pub no: f64,
    #[serde(default)]
    pub no2: f64,
    #[serde(default)]
    pub o3: f64,
    #[serde(default)]
    pub so2: f64,
    #[serde(default)]
    pub pm2_5: f64,
    #[serde(default)]
    pub pm10: f64,
    #[serde(default)]
    pub nh3: f64,
}

impl PollutantComponents {
    /// Display name and concentration for each pollutant, in a fixed order.
    pub fn entries(&self) -> [(&'static str, f64); 8] {
        [
            ("PM2.5", self.pm2_5),
            ("PM10", self.pm10),
            ("O3", self.o3),
            ("NO2", self.no2),
            ("SO2", self.so2),
            ("CO", self.co),
            ("NO", self.no),
            ("NH3", self.nh3),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReading {
    /// Provider index on its 1..=5 scale. Kept raw, out-of-range values included.
    pub index: i64,
    pub category: AqiCategory,
    pub components: PollutantComponents,
}

impl AirQualityReading {
    pub fn new(index: i64, components: PollutantComponents) -> Self {
        Self {
            index,
            category: AqiCategory::from_index(index),
            components,
        }
    }
}

/// One 3-hour forecast record, normalized but not yet aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp: i64,
    pub temp_min_c: i32,
    pub temp_max_c: i32,
    pub condition: String,
    pub description: String,
    pub icon: String,
    pub humidity_pct: u8,
    pub wind_speed_kmh: u32,
    pub precipitation_chance_pct: u8,
}

/// Summary of one calendar day.
///
/// Representative fields come from the first sample of the day; only the
/// temperature range is folded over every sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Timestamp of the day's first observed sample.
    pub date: i64,
    pub temp_min_c: i32,
    pub temp_max_c: i32,
    pub condition: String,
    pub description: String,
    pub icon: String,
    pub humidity_pct: u8,
    pub wind_speed_kmh: u32,
    pub precipitation_chance_pct: u8,
}

impl From<&ForecastSample> for ForecastDay {
    fn from(sample: &ForecastSample) -> Self {
        Self {
            date: sample.timestamp,
            temp_min_c: sample.temp_min_c.min(sample.temp_max_c),
            temp_max_c: sample.temp_max_c.max(sample.temp_min_c),
            condition: sample.condition.clone(),
            description: sample.description.clone(),
            icon: sample.icon.clone(),
            humidity_pct: sample.humidity_pct,
            wind_speed_kmh: sample.wind_speed_kmh,
            precipitation_chance_pct: sample.precipitation_chance_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightTone {
    Positive,
    Warning,
    Neutral,
}

/// Icon/category tag for an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightTopic {
    Umbrella,
    Sun,
    Clothing,
    Humidity,
    Wind,
    Exercise,
    Pleasant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub topic: InsightTopic,
    pub title: String,
    pub message: String,
    pub tone: InsightTone,
}

impl Insight {
    pub fn new(
        topic: InsightTopic,
        title: impl Into<String>,
        message: impl Into<String>,
        tone: InsightTone,
    ) -> Self {
        Self {
            topic,
            title: title.into(),
            message: message.into(),
            tone,
        }
    }
}

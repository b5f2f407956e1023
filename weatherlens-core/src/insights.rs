//! Advisory messages derived from current weather and air quality.

use crate::model::{AirQualityReading, Insight, InsightTone, InsightTopic, WeatherSnapshot};
use crate::units::AqiCategory;

/// Upper bound on insights shown at once.
pub const MAX_INSIGHTS: usize = 4;

const WARM_CLEAR_C: i32 = 25;
const PERCEIVED_DELTA_C: i32 = 3;
const HUMID_PCT: u8 = 80;
const DRY_PCT: u8 = 30;
const STRONG_WIND_KMH: u32 = 40;

/// Build between one and [`MAX_INSIGHTS`] insights, most important first.
///
/// Each category contributes at most one insight. When nothing applies a
/// single "Pleasant Conditions" insight is returned.
pub fn synthesize(weather: &WeatherSnapshot, air: &AirQualityReading) -> Vec<Insight> {
    let current = &weather.current;
    let mut insights = Vec::with_capacity(MAX_INSIGHTS + 2);

    match current.condition.as_str() {
        "Rain" | "Drizzle" => insights.push(Insight::new(
            InsightTopic::Umbrella,
            "Bring an Umbrella",
            "It's raining outside. Don't forget your umbrella if you're heading out.",
            InsightTone::Warning,
        )),
        "Clear" if current.temperature_c > WARM_CLEAR_C => insights.push(Insight::new(
            InsightTopic::Sun,
            "Sunny & Warm",
            "Great weather for outdoor activities! Stay hydrated and use sunscreen.",
            InsightTone::Positive,
        )),
        "Clear" => insights.push(Insight::new(
            InsightTopic::Sun,
            "Clear Skies",
            "Beautiful clear weather. Perfect for a walk or outdoor activities.",
            InsightTone::Positive,
        )),
        _ => {}
    }

    let delta = current.feels_like_c - current.temperature_c;
    if delta > PERCEIVED_DELTA_C {
        insights.push(Insight::new(
            InsightTopic::Clothing,
            "Feels Warmer",
            format!("Feels {delta}° warmer than actual. Dress lighter."),
            InsightTone::Neutral,
        ));
    } else if -delta > PERCEIVED_DELTA_C {
        insights.push(Insight::new(
            InsightTopic::Clothing,
            "Feels Colder",
            format!("Wind chill makes it feel {}° colder. Dress warmly.", -delta),
            InsightTone::Warning,
        ));
    }

    if current.humidity_pct > HUMID_PCT {
        insights.push(Insight::new(
            InsightTopic::Humidity,
            "High Humidity",
            "Very humid conditions. Stay cool and drink plenty of water.",
            InsightTone::Warning,
        ));
    } else if current.humidity_pct < DRY_PCT {
        insights.push(Insight::new(
            InsightTopic::Humidity,
            "Low Humidity",
            "Air is dry. Stay hydrated and use moisturizer if needed.",
            InsightTone::Neutral,
        ));
    }

    if current.wind_speed_kmh > STRONG_WIND_KMH {
        insights.push(Insight::new(
            InsightTopic::Wind,
            "Strong Winds",
            "Windy conditions today. Secure loose items outdoors.",
            InsightTone::Warning,
        ));
    }

    // Out-of-range indices classify as Hazardous, so go by category rather
    // than by the raw number.
    match air.category {
        category if category.is_outdoor_friendly() => insights.push(Insight::new(
            InsightTopic::Exercise,
            "Exercise Friendly",
            "Air quality is good. Great conditions for outdoor exercise.",
            InsightTone::Positive,
        )),
        AqiCategory::UnhealthyForSensitiveGroups => {}
        _ => insights.push(Insight::new(
            InsightTopic::Exercise,
            "Limit Outdoor Exercise",
            "Poor air quality. Consider indoor workouts today.",
            InsightTone::Warning,
        )),
    }

    if insights.is_empty() {
        insights.push(Insight::new(
            InsightTopic::Pleasant,
            "Pleasant Conditions",
            "Weather conditions are comfortable. Have a great day!",
            InsightTone::Positive,
        ));
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}

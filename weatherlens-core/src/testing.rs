//! Fixture builders shared by unit tests.

use crate::model::{
    AirQualityReading, Coordinates, CurrentConditions, ForecastDay, Location, PollutantComponents,
    SunTimes, WeatherSnapshot,
};
use crate::units::compass_direction;

pub(crate) fn snapshot(
    condition: &str,
    temperature_c: i32,
    feels_like_c: i32,
    humidity_pct: u8,
    wind_speed_kmh: u32,
) -> WeatherSnapshot {
    snapshot_for(
        "Zurich",
        Coordinates::new(47.37, 8.54),
        condition,
        temperature_c,
        feels_like_c,
        humidity_pct,
        wind_speed_kmh,
    )
}

pub(crate) fn snapshot_for(
    name: &str,
    coordinates: Coordinates,
    condition: &str,
    temperature_c: i32,
    feels_like_c: i32,
    humidity_pct: u8,
    wind_speed_kmh: u32,
) -> WeatherSnapshot {
    WeatherSnapshot {
        location: Location {
            name: name.to_string(),
            country: "CH".to_string(),
            coordinates,
        },
        current: CurrentConditions {
            temperature_c,
            feels_like_c,
            humidity_pct,
            pressure_hpa: 1013,
            visibility_km: Some(10),
            wind_speed_kmh,
            wind_degrees: 200,
            wind_direction: compass_direction(200.0),
            condition: condition.to_string(),
            description: condition.to_lowercase(),
            icon: "01d".to_string(),
            uv_index: None,
            cloud_cover_pct: 0,
        },
        sun: SunTimes {
            sunrise: 1_709_532_300,
            sunset: 1_709_573_400,
        },
        observed_at: 1_709_550_000,
    }
}

pub(crate) fn air_quality(index: i64) -> AirQualityReading {
    AirQualityReading::new(
        index,
        PollutantComponents {
            pm2_5: 5.0,
            pm10: 8.0,
            ..Default::default()
        },
    )
}

pub(crate) fn forecast_day(date: i64) -> ForecastDay {
    ForecastDay {
        date,
        temp_min_c: 8,
        temp_max_c: 16,
        condition: "Clouds".to_string(),
        description: "scattered clouds".to_string(),
        icon: "03d".to_string(),
        humidity_pct: 60,
        wind_speed_kmh: 12,
        precipitation_chance_pct: 10,
    }
}

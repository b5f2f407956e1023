use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::WeatherError,
    model::{AirQualityReading, Coordinates, ForecastDay, WeatherSnapshot},
};

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// The upstream weather service, seen through the dashboard data model.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a coordinate pair. UV data is best-effort.
    async fn weather_by_coords(&self, coords: Coordinates) -> Result<WeatherSnapshot, WeatherError>;

    /// Resolve a free-text city name to coordinates.
    async fn geocode(&self, city: &str) -> Result<Coordinates, WeatherError>;

    async fn air_quality(&self, coords: Coordinates) -> Result<AirQualityReading, WeatherError>;

    /// Up to five daily summaries, earliest first.
    async fn forecast(&self, coords: Coordinates) -> Result<Vec<ForecastDay>, WeatherError>;

    /// Current conditions for a city: geocode first, then the coordinate path.
    async fn weather_by_city(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let coords = self.geocode(city).await?;
        self.weather_by_coords(coords).await
    }
}

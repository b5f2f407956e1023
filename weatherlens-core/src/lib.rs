//! Core library for the WeatherLens dashboard.
//!
//! This crate defines:
//! - The dashboard data model and its unit conversions
//! - The OpenWeatherMap adapter (current weather, air quality, forecast, geocoding)
//! - Daily forecast aggregation and insight synthesis
//! - Position resolution and the session that ties one load cycle together
//! - Configuration & credentials handling
//!
//! It is used by `weatherlens-cli`, but can also back other front ends.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod insights;
pub mod location;
pub mod model;
pub mod provider;
pub mod session;
pub mod units;

#[cfg(test)]
mod testing;

pub use config::{Config, Endpoints, LocationConfig, Theme};
pub use error::{ErrorKind, LocationError, WeatherError};
pub use location::{LocationResolver, PermissionState, PositionSource};
pub use model::{
    AirQualityReading, Coordinates, CurrentConditions, ForecastDay, Insight, InsightTone,
    InsightTopic, Location, WeatherSnapshot,
};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use session::{Session, SessionError, SessionStatus, SessionView};

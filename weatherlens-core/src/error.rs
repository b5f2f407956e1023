use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upstream endpoints, used to label errors and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CurrentWeather,
    UvIndex,
    Geocoding,
    AirPollution,
    Forecast,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::CurrentWeather => "current weather",
            Endpoint::UvIndex => "uv index",
            Endpoint::Geocoding => "geocoding",
            Endpoint::AirPollution => "air pollution",
            Endpoint::Forecast => "forecast",
        }
    }

    /// What the user was waiting for when this endpoint failed.
    fn failure(&self) -> &'static str {
        match self {
            Endpoint::CurrentWeather => "fetch weather data",
            Endpoint::UvIndex => "fetch UV index",
            Endpoint::Geocoding => "find city",
            Endpoint::AirPollution => "fetch air quality data",
            Endpoint::Forecast => "fetch forecast data",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of the platform position capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Geolocation is not supported on this device. Please set a location or search for a city.")]
    Unsupported,
    #[error("Location access denied. Please enable location or search for a city.")]
    PermissionDenied,
    #[error("Location information unavailable. Please search for a city.")]
    PositionUnavailable,
    #[error("Location request timed out. Please try again or search for a city.")]
    Timeout,
    #[error("Unable to get location. Please search for a city.")]
    Unknown,
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Failed to {} (status {})", .endpoint.failure(), .status)]
    Upstream { endpoint: Endpoint, status: u16 },

    #[error("City not found. Please check the spelling and try again.")]
    NotFound { query: String },

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("Failed to reach the {endpoint} service: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse {endpoint} response: {source}")]
    Parse {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("The {endpoint} response contained no data")]
    EmptyResponse { endpoint: Endpoint },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Coarse classification the presentation layer branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Location,
    NotFound,
    Upstream,
    Unknown,
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::Location(_) => ErrorKind::Location,
            WeatherError::NotFound { .. } => ErrorKind::NotFound,
            WeatherError::Upstream { .. } => ErrorKind::Upstream,
            WeatherError::Transport { .. }
            | WeatherError::Parse { .. }
            | WeatherError::EmptyResponse { .. }
            | WeatherError::Client(_) => ErrorKind::Unknown,
        }
    }
}

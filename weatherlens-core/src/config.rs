use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::{
    location::{
        DisabledPosition, FixedPosition, LocationResolver, MAXIMUM_AGE, POSITION_TIMEOUT,
        PositionSource,
    },
    model::Coordinates,
};

/// Base URLs for the OpenWeatherMap APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Weather, UV, air pollution and forecast endpoints live here.
    pub base_url: String,
    /// Direct geocoding.
    pub geo_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            geo_url: "https://api.openweathermap.org/geo/1.0".to_string(),
        }
    }
}

impl Endpoints {
    /// Both APIs behind one host, laid out like api.openweathermap.org.
    pub fn with_host(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            base_url: format!("{host}/data/2.5"),
            geo_url: format!("{host}/geo/1.0"),
        }
    }
}

/// Where the device position comes from.
///
/// Example TOML:
/// [location]
/// latitude = 47.37
/// longitude = 8.54
/// timeout_secs = 10
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// `false` behaves like a denied location permission.
    pub enabled: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Budget for one position request.
    pub timeout_secs: u64,
    /// How long a position fix is reused.
    pub maximum_age_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
            timeout_secs: POSITION_TIMEOUT.as_secs(),
            maximum_age_secs: MAXIMUM_AGE.as_secs(),
        }
    }
}

impl LocationConfig {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn maximum_age(&self) -> Duration {
        Duration::from_secs(self.maximum_age_secs)
    }
}

/// Display preference for the terminal dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Unicode symbols.
    #[default]
    Rich,
    /// ASCII only.
    Plain,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Rich => "rich",
            Theme::Plain => "plain",
        }
    }

    pub const fn all() -> &'static [Theme] {
        &[Theme::Rich, Theme::Plain]
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeatherMap API key.
    pub api_key: Option<String>,

    pub endpoints: Endpoints,

    pub location: LocationConfig,

    pub theme: Theme,

    /// Per-request timeout for provider calls.
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoints: Endpoints::default(),
            location: LocationConfig::default(),
            theme: Theme::default(),
            http_timeout_secs: Self::DEFAULT_HTTP_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Environment variable that overrides the stored API key.
    pub const API_KEY_ENV: &'static str = "WEATHERLENS_API_KEY";

    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

    /// Load config from disk and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;

        if let Ok(key) = std::env::var(Self::API_KEY_ENV) {
            if !key.trim().is_empty() {
                cfg.set_api_key(key);
            }
        }

        Ok(cfg)
    }

    /// Load config from `path`, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherlens", "weatherlens")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    pub fn set_location(&mut self, coordinates: Option<Coordinates>) {
        self.location.latitude = coordinates.map(|c| c.latitude);
        self.location.longitude = coordinates.map(|c| c.longitude);
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// The position source described by `[location]`.
    ///
    /// `None` means no position capability: nothing configured.
    pub fn position_source(&self) -> Option<Box<dyn PositionSource>> {
        if !self.location.enabled {
            return Some(Box::new(DisabledPosition));
        }

        self.location
            .coordinates()
            .map(|coords| Box::new(FixedPosition::new(coords)) as Box<dyn PositionSource>)
    }

    /// A resolver using the `[location]` timings.
    ///
    /// `coordinates` (e.g. from the command line) take precedence over the
    /// configured source.
    pub fn location_resolver(&self, coordinates: Option<Coordinates>) -> LocationResolver {
        let source = match coordinates {
            Some(coords) => Some(Box::new(FixedPosition::new(coords)) as Box<dyn PositionSource>),
            None => self.position_source(),
        };

        LocationResolver::new(source)
            .with_timeout(self.location.timeout())
            .with_maximum_age(self.location.maximum_age())
    }
}

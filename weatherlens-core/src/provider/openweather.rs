use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    aggregate::aggregate_daily,
    config::{Config, Endpoints},
    error::{Endpoint, WeatherError},
    model::{
        AirQualityReading, Coordinates, CurrentConditions, ForecastDay, ForecastSample, Location,
        PollutantComponents, SunTimes, WeatherSnapshot,
    },
    units::{compass_direction, fraction_to_pct, meters_to_km, mps_to_kmh, round_half_up},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    endpoints: Endpoints,
}

impl OpenWeatherProvider {
    pub fn with_settings(
        api_key: String,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(WeatherError::Client)?;

        Ok(Self {
            api_key,
            http,
            endpoints,
        })
    }

    /// Build a provider from the stored configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            anyhow!(
                "No OpenWeatherMap API key configured.\n\
                 Hint: run `weatherlens configure` or set {}.",
                Config::API_KEY_ENV
            )
        })?;

        Ok(Self::with_settings(
            api_key.to_owned(),
            config.endpoints.clone(),
            config.http_timeout(),
        )?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        tracing::debug!(%endpoint, url, "sending request to OpenWeather");

        let res = self
            .http
            .get(url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| WeatherError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| WeatherError::Transport { endpoint, source })?;

        if !status.is_success() {
            tracing::warn!(
                %endpoint,
                %status,
                body = %truncate_body(&body),
                "OpenWeather request failed"
            );
            return Err(WeatherError::Upstream {
                endpoint,
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&body).map_err(|source| WeatherError::Parse { endpoint, source })
    }

    /// UV index, or `None` if the endpoint fails for any reason.
    async fn fetch_uv(&self, coords: Coordinates) -> Option<f64> {
        let url = format!("{}/uvi", self.endpoints.base_url);

        match self
            .get_json::<OwUvResponse>(Endpoint::UvIndex, &url, &coord_params(coords))
            .await
        {
            Ok(uv) => uv.value,
            Err(err @ WeatherError::Upstream { .. }) => {
                tracing::debug!(error = %err, "UV index endpoint unavailable");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "UV index request failed");
                None
            }
        }
    }
}

fn coord_params(coords: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("lat", coords.latitude.to_string()),
        ("lon", coords.longitude.to_string()),
    ]
}

fn metric_coord_params(coords: Coordinates) -> Vec<(&'static str, String)> {
    let mut params = coord_params(coords);
    params.push(("units", "metric".to_string()));
    params
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn weather_by_coords(
        &self,
        coords: Coordinates,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/weather", self.endpoints.base_url);
        let params = metric_coord_params(coords);

        let (current, uv_index) = tokio::join!(
            self.get_json::<OwCurrentResponse>(Endpoint::CurrentWeather, &url, &params),
            self.fetch_uv(coords),
        );

        Ok(current?.into_snapshot(uv_index))
    }

    async fn geocode(&self, city: &str) -> Result<Coordinates, WeatherError> {
        let url = format!("{}/direct", self.endpoints.geo_url);
        let params = [("q", city.to_string()), ("limit", "1".to_string())];

        let matches: Vec<OwGeoMatch> = self.get_json(Endpoint::Geocoding, &url, &params).await?;

        let found = matches.into_iter().next().ok_or_else(|| WeatherError::NotFound {
            query: city.to_string(),
        })?;

        tracing::info!(
            query = city,
            name = %found.name,
            country = found.country.as_deref().unwrap_or(""),
            lat = found.lat,
            lon = found.lon,
            "geocoded city"
        );

        Ok(Coordinates::new(found.lat, found.lon))
    }

    async fn air_quality(&self, coords: Coordinates) -> Result<AirQualityReading, WeatherError> {
        let url = format!("{}/air_pollution", self.endpoints.base_url);

        let parsed: OwAirResponse = self
            .get_json(Endpoint::AirPollution, &url, &coord_params(coords))
            .await?;

        let entry = parsed
            .list
            .into_iter()
            .next()
            .ok_or(WeatherError::EmptyResponse {
                endpoint: Endpoint::AirPollution,
            })?;

        Ok(AirQualityReading::new(entry.main.aqi, entry.components))
    }

    async fn forecast(&self, coords: Coordinates) -> Result<Vec<ForecastDay>, WeatherError> {
        let url = format!("{}/forecast", self.endpoints.base_url);

        let parsed: OwForecastResponse = self
            .get_json(Endpoint::Forecast, &url, &metric_coord_params(coords))
            .await?;

        let samples: Vec<ForecastSample> = parsed.list.iter().map(ForecastSample::from).collect();
        Ok(aggregate_daily(&samples))
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    #[serde(default)]
    all: u8,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    coord: OwCoord,
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    visibility: Option<f64>,
    #[serde(default)]
    clouds: OwClouds,
    #[serde(default)]
    sys: OwSys,
}

impl OwCurrentResponse {
    fn into_snapshot(self, uv_index: Option<f64>) -> WeatherSnapshot {
        let weather = primary_weather(&self.weather);

        WeatherSnapshot {
            location: Location {
                name: self.name,
                country: self.sys.country,
                coordinates: Coordinates::new(self.coord.lat, self.coord.lon),
            },
            current: CurrentConditions {
                temperature_c: round_half_up(self.main.temp),
                feels_like_c: round_half_up(self.main.feels_like),
                humidity_pct: self.main.humidity,
                pressure_hpa: round_half_up(self.main.pressure).max(0) as u32,
                visibility_km: self.visibility.map(meters_to_km),
                wind_speed_kmh: mps_to_kmh(self.wind.speed),
                wind_degrees: round_half_up(self.wind.deg).rem_euclid(360) as u16,
                wind_direction: compass_direction(self.wind.deg),
                condition: weather.main,
                description: weather.description,
                icon: weather.icon,
                uv_index,
                cloud_cover_pct: self.clouds.all,
            },
            sun: SunTimes {
                sunrise: self.sys.sunrise,
                sunset: self.sys.sunset,
            },
            observed_at: self.dt,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwUvResponse {
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwGeoMatch {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwAqi {
    aqi: i64,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    main: OwAqi,
    #[serde(default)]
    components: PollutantComponents,
}

#[derive(Debug, Deserialize)]
struct OwAirResponse {
    #[serde(default)]
    list: Vec<OwAirEntry>,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

impl From<&OwForecastEntry> for ForecastSample {
    fn from(entry: &OwForecastEntry) -> Self {
        let weather = primary_weather(&entry.weather);

        ForecastSample {
            timestamp: entry.dt,
            temp_min_c: round_half_up(entry.main.temp_min),
            temp_max_c: round_half_up(entry.main.temp_max),
            condition: weather.main,
            description: weather.description,
            icon: weather.icon,
            humidity_pct: entry.main.humidity,
            wind_speed_kmh: mps_to_kmh(entry.wind.speed),
            precipitation_chance_pct: fraction_to_pct(entry.pop),
        }
    }
}

fn primary_weather(weather: &[OwWeather]) -> OwWeather {
    weather.first().cloned().unwrap_or_else(|| OwWeather {
        main: "Unknown".to_string(),
        description: "unknown".to_string(),
        icon: String::new(),
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

//! Load-cycle orchestration for the dashboard.
//!
//! A [`Session`] owns the current snapshot and publishes it as a read-only
//! [`SessionView`] through a `watch` channel. Every operation that fetches
//! starts a new cycle with a fresh sequence number. Only the most recently
//! started cycle may write to the view; results of superseded cycles are
//! dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::watch;

use crate::{
    error::{ErrorKind, WeatherError},
    insights::synthesize,
    location::{LocationResolver, PermissionState},
    model::{AirQualityReading, Coordinates, ForecastDay, Insight, WeatherSnapshot},
    provider::WeatherProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// A failed cycle, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&WeatherError> for SessionError {
    fn from(err: &WeatherError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Everything the presentation layer needs to draw the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionView {
    pub status: SessionStatus,
    pub loading: bool,
    pub weather: Option<WeatherSnapshot>,
    pub air_quality: Option<AirQualityReading>,
    pub forecast: Vec<ForecastDay>,
    pub insights: Vec<Insight>,
    pub error: Option<SessionError>,
    pub permission: PermissionState,
}

impl SessionView {
    pub fn is_location_error(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|err| err.kind == ErrorKind::Location)
    }
}

struct Payload {
    weather: WeatherSnapshot,
    air_quality: AirQualityReading,
    forecast: Vec<ForecastDay>,
}

#[derive(Debug)]
pub struct Session {
    provider: Arc<dyn WeatherProvider>,
    resolver: LocationResolver,
    state: watch::Sender<SessionView>,
    latest_cycle: AtomicU64,
}

impl Session {
    pub fn new(provider: Arc<dyn WeatherProvider>, resolver: LocationResolver) -> Self {
        let (state, _) = watch::channel(SessionView::default());
        Self {
            provider,
            resolver,
            state,
            latest_cycle: AtomicU64::new(0),
        }
    }

    /// Copy of the current view.
    pub fn view(&self) -> SessionView {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.state.subscribe()
    }

    /// Query the permission state, then load weather for the current position.
    pub async fn initial_load(&self) {
        let permission = self.resolver.permission_state().await;
        self.state.send_modify(|view| view.permission = permission);
        self.refresh_location().await;
    }

    /// Load weather for a city by name. Blank input is ignored.
    pub async fn search_city(&self, name: &str) {
        let city = name.trim();
        if city.is_empty() {
            tracing::debug!("ignoring blank city search");
            return;
        }

        let cycle = self.begin_cycle();
        let outcome = self.load_city(city).await;
        cycle.finish(outcome);
    }

    /// Resolve the device position again and reload everything for it.
    pub async fn refresh_location(&self) {
        let cycle = self.begin_cycle();

        match self.resolver.current_position().await {
            Ok(coords) => {
                cycle.update(|view| view.permission = PermissionState::Granted);
                let outcome = self.load_coords(coords).await;
                cycle.finish(outcome);
            }
            Err(err) => {
                cycle.update(|view| view.permission = PermissionState::Denied);
                cycle.finish(Err(err.into()));
            }
        }
    }

    async fn load_city(&self, city: &str) -> Result<Payload, WeatherError> {
        let weather = self.provider.weather_by_city(city).await?;
        let coords = weather.location.coordinates;

        let (air_quality, forecast) = tokio::try_join!(
            self.provider.air_quality(coords),
            self.provider.forecast(coords),
        )?;

        Ok(Payload {
            weather,
            air_quality,
            forecast,
        })
    }

    async fn load_coords(&self, coords: Coordinates) -> Result<Payload, WeatherError> {
        let (weather, air_quality, forecast) = tokio::try_join!(
            self.provider.weather_by_coords(coords),
            self.provider.air_quality(coords),
            self.provider.forecast(coords),
        )?;

        Ok(Payload {
            weather,
            air_quality,
            forecast,
        })
    }

    fn begin_cycle(&self) -> Cycle<'_> {
        let mut id = 0;
        self.state.send_modify(|view| {
            id = self.latest_cycle.fetch_add(1, Ordering::SeqCst) + 1;
            view.status = SessionStatus::Loading;
            view.loading = true;
            view.error = None;
        });

        tracing::debug!(cycle = id, "load cycle started");
        Cycle {
            session: self,
            id,
            settled: false,
        }
    }
}

/// Write access to the view for one load cycle.
///
/// Dropping an unsettled cycle (e.g. a cancelled future) still clears the
/// loading flag.
struct Cycle<'a> {
    session: &'a Session,
    id: u64,
    settled: bool,
}

impl Cycle<'_> {
    /// Apply `f` if no newer cycle has started. Returns whether it was applied.
    fn update(&self, f: impl FnOnce(&mut SessionView)) -> bool {
        let latest = &self.session.latest_cycle;
        let id = self.id;

        self.session.state.send_if_modified(|view| {
            if latest.load(Ordering::SeqCst) != id {
                return false;
            }
            f(view);
            true
        })
    }

    fn finish(mut self, outcome: Result<Payload, WeatherError>) {
        self.settled = true;
        let id = self.id;

        let applied = match outcome {
            Ok(payload) => {
                let insights = synthesize(&payload.weather, &payload.air_quality);
                let location = payload.weather.location.name.clone();

                let applied = self.update(|view| {
                    view.weather = Some(payload.weather);
                    view.air_quality = Some(payload.air_quality);
                    view.forecast = payload.forecast;
                    view.insights = insights;
                    view.status = SessionStatus::Ready;
                    view.loading = false;
                });
                if applied {
                    tracing::info!(cycle = id, %location, "load cycle complete");
                }
                applied
            }
            Err(err) => {
                let error = SessionError::from(&err);
                let applied = self.update(|view| {
                    view.error = Some(error);
                    view.status = SessionStatus::Error;
                    view.loading = false;
                });
                if applied {
                    tracing::warn!(cycle = id, error = %err, "load cycle failed");
                }
                applied
            }
        };

        if !applied {
            tracing::warn!(cycle = id, "discarding result of superseded load cycle");
        }
    }
}

impl Drop for Cycle<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        tracing::debug!(cycle = self.id, "load cycle abandoned");
        self.update(|view| {
            view.loading = false;
            view.status = if view.weather.is_some() {
                SessionStatus::Ready
            } else {
                SessionStatus::Idle
            };
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Endpoint, LocationError};
    use crate::location::{DisabledPosition, FixedPosition};
    use crate::testing::{air_quality, forecast_day, snapshot_for};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    const HERE: Coordinates = Coordinates {
        latitude: 47.37,
        longitude: 8.54,
    };

    #[derive(Debug)]
    struct City {
        name: &'static str,
        coords: Coordinates,
        delay: Duration,
    }

    #[derive(Debug, Default)]
    struct FakeProvider {
        cities: Vec<City>,
        air_index: i64,
        air_fails: bool,
        requests: AtomicUsize,
    }

    impl FakeProvider {
        fn new(air_index: i64) -> Self {
            Self {
                air_index,
                ..Default::default()
            }
        }

        fn with_city(mut self, name: &'static str, coords: Coordinates, delay: Duration) -> Self {
            self.cities.push(City {
                name,
                coords,
                delay,
            });
            self
        }

        fn failing_air(mut self) -> Self {
            self.air_fails = true;
            self
        }

        fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn weather_by_coords(
            &self,
            coords: Coordinates,
        ) -> Result<WeatherSnapshot, WeatherError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let name = self
                .cities
                .iter()
                .find(|c| c.coords == coords)
                .map_or("Here", |c| c.name);
            Ok(snapshot_for(name, coords, "Clear", 28, 28, 50, 10))
        }

        async fn geocode(&self, city: &str) -> Result<Coordinates, WeatherError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let found = self
                .cities
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(city))
                .ok_or_else(|| WeatherError::NotFound {
                    query: city.to_string(),
                })?;
            tokio::time::sleep(found.delay).await;
            Ok(found.coords)
        }

        async fn air_quality(
            &self,
            _coords: Coordinates,
        ) -> Result<AirQualityReading, WeatherError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.air_fails {
                return Err(WeatherError::Upstream {
                    endpoint: Endpoint::AirPollution,
                    status: 500,
                });
            }
            Ok(air_quality(self.air_index))
        }

        async fn forecast(&self, _coords: Coordinates) -> Result<Vec<ForecastDay>, WeatherError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(vec![forecast_day(1_709_510_400), forecast_day(1_709_596_800)])
        }
    }

    fn session_with(provider: Arc<FakeProvider>, resolver: LocationResolver) -> Session {
        Session::new(provider, resolver)
    }

    fn fixed_here() -> LocationResolver {
        LocationResolver::new(Some(Box::new(FixedPosition::new(HERE))))
    }

    fn titles(view: &SessionView) -> Vec<&str> {
        view.insights.iter().map(|i| i.title.as_str()).collect()
    }

    #[tokio::test]
    async fn starts_idle() {
        let session = session_with(Arc::new(FakeProvider::new(1)), fixed_here());
        let view = session.view();
        assert_eq!(view.status, SessionStatus::Idle);
        assert!(!view.loading);
        assert!(view.weather.is_none());
        assert_eq!(view.permission, PermissionState::Unknown);
    }

    #[tokio::test]
    async fn initial_load_fetches_everything_for_current_position() {
        let provider = Arc::new(FakeProvider::new(1));
        let session = session_with(provider.clone(), fixed_here());

        session.initial_load().await;
        let view = session.view();

        assert_eq!(view.status, SessionStatus::Ready);
        assert!(!view.loading);
        assert!(view.error.is_none());
        assert_eq!(view.permission, PermissionState::Granted);
        assert_eq!(view.weather.as_ref().map(|w| w.location.coordinates), Some(HERE));
        assert_eq!(view.air_quality.as_ref().map(|a| a.index), Some(1));
        assert_eq!(view.forecast.len(), 2);
        assert_eq!(titles(&view), ["Sunny & Warm", "Exercise Friendly"]);
        assert_eq!(provider.requests(), 3);
    }

    #[tokio::test]
    async fn initial_load_without_position_capability_errors() {
        let provider = Arc::new(FakeProvider::new(1));
        let session = session_with(provider.clone(), LocationResolver::new(None));

        session.initial_load().await;
        let view = session.view();

        assert_eq!(view.status, SessionStatus::Error);
        assert!(!view.loading);
        assert!(view.is_location_error());
        assert_eq!(
            view.error.as_ref().map(|e| e.message.clone()),
            Some(LocationError::Unsupported.to_string())
        );
        assert_eq!(view.permission, PermissionState::Denied);
        assert!(view.weather.is_none());
        assert_eq!(provider.requests(), 0);
    }

    #[tokio::test]
    async fn refresh_with_denied_permission() {
        let session = session_with(
            Arc::new(FakeProvider::new(1)),
            LocationResolver::new(Some(Box::new(DisabledPosition))),
        );

        session.refresh_location().await;
        let view = session.view();

        assert_eq!(view.permission, PermissionState::Denied);
        let error = view.error.expect("error expected");
        assert_eq!(error.kind, ErrorKind::Location);
        assert!(error.message.contains("Location access denied"));
    }

    #[tokio::test]
    async fn blank_search_is_a_no_op() {
        let provider = Arc::new(FakeProvider::new(1));
        let session = session_with(provider.clone(), fixed_here());
        let mut rx = session.subscribe();

        session.search_city("").await;
        session.search_city("   \t").await;

        assert!(!rx.has_changed().expect("sender alive"));
        assert_eq!(session.view(), SessionView::default());
        assert_eq!(provider.requests(), 0);
    }

    #[tokio::test]
    async fn search_city_loads_resolved_coordinates() {
        let berlin = Coordinates::new(52.52, 13.40);
        let provider =
            Arc::new(FakeProvider::new(4).with_city("Berlin", berlin, Duration::ZERO));
        let session = session_with(provider.clone(), fixed_here());

        session.search_city("  berlin ").await;
        let view = session.view();

        assert_eq!(view.status, SessionStatus::Ready);
        let weather = view.weather.as_ref().expect("weather");
        assert_eq!(weather.location.name, "Berlin");
        assert_eq!(weather.location.coordinates, berlin);
        assert_eq!(titles(&view), ["Sunny & Warm", "Limit Outdoor Exercise"]);
        // geocode + weather + air + forecast
        assert_eq!(provider.requests(), 4);
    }

    #[tokio::test]
    async fn unknown_city_keeps_previous_snapshot() {
        let session = session_with(Arc::new(FakeProvider::new(1)), fixed_here());
        session.initial_load().await;
        let before = session.view();

        session.search_city("Atlantis").await;
        let after = session.view();

        assert_eq!(after.status, SessionStatus::Error);
        let error = after.error.as_ref().expect("error expected");
        assert_eq!(error.kind, ErrorKind::NotFound);
        assert!(error.message.contains("check the spelling"));
        assert_eq!(after.weather, before.weather);
        assert_eq!(after.air_quality, before.air_quality);
        assert_eq!(after.forecast, before.forecast);
        assert_eq!(after.insights, before.insights);
        assert!(!after.is_location_error());
    }

    #[tokio::test]
    async fn one_failed_fetch_fails_the_cycle() {
        let provider = Arc::new(FakeProvider::new(1).failing_air());
        let session = session_with(provider, fixed_here());

        session.refresh_location().await;
        let view = session.view();

        assert_eq!(view.status, SessionStatus::Error);
        assert!(view.weather.is_none());
        assert!(view.forecast.is_empty());
        assert_eq!(view.error.map(|e| e.kind), Some(ErrorKind::Upstream));
        // location itself worked
        assert_eq!(view.permission, PermissionState::Granted);
    }

    #[tokio::test]
    async fn new_cycle_clears_previous_error() {
        let berlin = Coordinates::new(52.52, 13.40);
        let session = session_with(
            Arc::new(FakeProvider::new(2).with_city("Berlin", berlin, Duration::ZERO)),
            fixed_here(),
        );

        session.search_city("Nowhere").await;
        assert!(session.view().error.is_some());

        session.search_city("Berlin").await;
        let view = session.view();
        assert!(view.error.is_none());
        assert_eq!(view.status, SessionStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_marks_loading_and_clears_error_before_fetching() {
        let slow = Coordinates::new(10.0, 10.0);
        let session = session_with(
            Arc::new(FakeProvider::new(1).with_city("Slow", slow, Duration::from_secs(5))),
            fixed_here(),
        );
        let rx = session.subscribe();

        session.search_city("Nowhere").await;
        assert!(rx.borrow().error.is_some());

        let search = session.search_city("Slow");
        tokio::pin!(search);
        let pending = tokio::time::timeout(Duration::from_secs(1), &mut search).await;
        assert!(pending.is_err(), "geocode should still be pending");

        {
            let view = rx.borrow();
            assert!(view.loading);
            assert_eq!(view.status, SessionStatus::Loading);
            assert_eq!(view.error, None);
            assert!(view.weather.is_none());
        }

        search.await;
        let view = rx.borrow();
        assert!(!view.loading);
        assert_eq!(view.status, SessionStatus::Ready);
        assert_eq!(view.weather.as_ref().map(|w| w.location.coordinates), Some(slow));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_cycle_results_are_discarded() {
        let slow = Coordinates::new(10.0, 10.0);
        let fast = Coordinates::new(20.0, 20.0);
        let provider = Arc::new(
            FakeProvider::new(1)
                .with_city("Slow", slow, Duration::from_secs(5))
                .with_city("Fast", fast, Duration::ZERO),
        );
        let session = session_with(provider, fixed_here());

        tokio::join!(session.search_city("Slow"), session.search_city("Fast"));
        let view = session.view();

        assert_eq!(view.status, SessionStatus::Ready);
        assert!(!view.loading);
        assert_eq!(view.weather.map(|w| w.location.name), Some("Fast".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_cycle_still_clears_loading() {
        let slow = Coordinates::new(10.0, 10.0);
        let provider =
            Arc::new(FakeProvider::new(1).with_city("Slow", slow, Duration::from_secs(60)));
        let session = session_with(provider, fixed_here());
        let rx = session.subscribe();

        let result =
            tokio::time::timeout(Duration::from_secs(1), session.search_city("Slow")).await;
        assert!(result.is_err());

        let view = rx.borrow().clone();
        assert!(!view.loading);
        assert_eq!(view.status, SessionStatus::Idle);
    }

    #[tokio::test]
    async fn subscribers_are_notified_of_new_snapshots() {
        let session = session_with(Arc::new(FakeProvider::new(1)), fixed_here());
        let mut rx = session.subscribe();

        session.refresh_location().await;

        assert!(rx.has_changed().expect("sender alive"));
        let view = rx.borrow_and_update().clone();
        assert_eq!(view.status, SessionStatus::Ready);
        assert!(!view.loading);
        assert!(!rx.has_changed().expect("sender alive"));
    }
}

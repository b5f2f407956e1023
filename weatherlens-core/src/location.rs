//! Single-shot position lookup.
//!
//! A [`PositionSource`] stands in for the platform geolocation capability.
//! [`LocationResolver`] puts a fixed time budget and a short-lived cache in
//! front of it and reduces every failure to a [`LocationError`].

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::LocationError;
use crate::model::Coordinates;

/// How long a single position request may take.
pub const POSITION_TIMEOUT: Duration = Duration::from_secs(10);

/// How old a cached fix may be before a new one is requested.
pub const MAXIMUM_AGE: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
    #[default]
    Unknown,
}

#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, LocationError>;

    /// `None` when the platform cannot report its permission state.
    async fn permission(&self) -> Option<PermissionState> {
        None
    }
}

/// A position fixed ahead of time, e.g. from the config file.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition {
    coordinates: Coordinates,
}

impl FixedPosition {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl PositionSource for FixedPosition {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Ok(self.coordinates)
    }

    async fn permission(&self) -> Option<PermissionState> {
        Some(PermissionState::Granted)
    }
}

/// Location access switched off by the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPosition;

#[async_trait]
impl PositionSource for DisabledPosition {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::PermissionDenied)
    }

    async fn permission(&self) -> Option<PermissionState> {
        Some(PermissionState::Denied)
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedFix {
    coordinates: Coordinates,
    taken_at: Instant,
}

#[derive(Debug)]
pub struct LocationResolver {
    source: Option<Box<dyn PositionSource>>,
    timeout: Duration,
    maximum_age: Duration,
    last_fix: Mutex<Option<CachedFix>>,
}

impl LocationResolver {
    /// `None` means the device has no position capability at all.
    pub fn new(source: Option<Box<dyn PositionSource>>) -> Self {
        Self {
            source,
            timeout: POSITION_TIMEOUT,
            maximum_age: MAXIMUM_AGE,
            last_fix: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_maximum_age(mut self, maximum_age: Duration) -> Self {
        self.maximum_age = maximum_age;
        self
    }

    pub fn is_supported(&self) -> bool {
        self.source.is_some()
    }

    /// Current permission state, or `Unknown` where it cannot be queried.
    pub async fn permission_state(&self) -> PermissionState {
        match &self.source {
            Some(source) => source.permission().await.unwrap_or_default(),
            None => PermissionState::Unknown,
        }
    }

    /// Resolve the device position once.
    ///
    /// A fix younger than the maximum age is returned without asking the
    /// source again.
    pub async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let source = self.source.as_ref().ok_or(LocationError::Unsupported)?;

        if let Some(fix) = *self.last_fix.lock().await {
            if fix.taken_at.elapsed() <= self.maximum_age {
                tracing::debug!(coordinates = %fix.coordinates, "using cached position");
                return Ok(fix.coordinates);
            }
        }

        let coordinates = tokio::time::timeout(self.timeout, source.locate())
            .await
            .map_err(|_| {
                tracing::warn!(timeout = ?self.timeout, "position request timed out");
                LocationError::Timeout
            })??;

        *self.last_fix.lock().await = Some(CachedFix {
            coordinates,
            taken_at: Instant::now(),
        });

        tracing::debug!(%coordinates, "resolved position");
        Ok(coordinates)
    }
}

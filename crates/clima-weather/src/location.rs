//! Device geolocation.
//!
//! Platform position sources implement [`Geolocator`]. [`DeviceLocator`]
//! wraps one with the request timeout and position-age policy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::{Location, LocationError};

/// Display name for a position obtained from the device.
pub const DEVICE_LOCATION_NAME: &str = "Your location";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// A cached position younger than this may be returned instead of a fresh one.
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in metres, when the source reports one
    pub accuracy: Option<f64>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
        }
    }

    pub fn into_location(self) -> Location {
        Location::new(DEVICE_LOCATION_NAME, self.latitude, self.longitude)
    }
}

/// One-shot position source.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self, options: &GeolocationOptions)
        -> Result<Position, LocationError>;
}

/// Always reports the configured coordinates.
#[derive(Debug, Clone)]
pub struct FixedGeolocator {
    position: Position,
}

impl FixedGeolocator {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position::new(latitude, longitude),
        }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Position, LocationError> {
        Ok(self.position)
    }
}

/// For hosts without any position source.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedGeolocator;

#[async_trait]
impl Geolocator for UnsupportedGeolocator {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Position, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Applies [`GeolocationOptions`] on top of a raw [`Geolocator`].
///
/// Requests that outlive `timeout` fail with [`LocationError::Timeout`]; a
/// previous fix younger than `maximum_age` is returned without asking the
/// source again.
pub struct DeviceLocator {
    source: Arc<dyn Geolocator>,
    options: GeolocationOptions,
    last_fix: Mutex<Option<(Position, Instant)>>,
}

impl DeviceLocator {
    pub fn new(source: Arc<dyn Geolocator>, options: GeolocationOptions) -> Self {
        Self {
            source,
            options,
            last_fix: Mutex::new(None),
        }
    }

    pub async fn locate(&self) -> Result<Location, LocationError> {
        if let Some(position) = self.recent_fix() {
            tracing::debug!("Reusing cached device position");
            return Ok(position.into_location());
        }

        let request = self.source.current_position(&self.options);
        let position = match tokio::time::timeout(self.options.timeout, request).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("Geolocation timed out after {:?}", self.options.timeout);
                return Err(LocationError::Timeout);
            }
        };

        *self.last_fix.lock() = Some((position, Instant::now()));
        tracing::info!(
            "Device located at {:.4}, {:.4}",
            position.latitude,
            position.longitude
        );
        Ok(position.into_location())
    }

    fn recent_fix(&self) -> Option<Position> {
        let guard = self.last_fix.lock();
        let (position, acquired_at) = (*guard)?;
        (acquired_at.elapsed() < self.options.maximum_age).then_some(position)
    }
}

impl std::fmt::Debug for DeviceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLocator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

//! Weather data for Clima
//!
//! Talks to the Clima weather backend, caches its responses for a few
//! minutes and resolves the device position.

pub mod cache;
pub mod client;
pub mod codes;
pub mod location;
pub mod types;

pub use cache::{CachedPayload, FreshnessCache};
pub use client::{WeatherApi, WeatherApiClient, DEFAULT_FORECAST_DAYS};
pub use codes::{describe_code, icon_for_code};
pub use location::{
    DeviceLocator, FixedGeolocator, GeolocationOptions, Geolocator, Position,
    UnsupportedGeolocator, DEVICE_LOCATION_NAME,
};
pub use types::*;

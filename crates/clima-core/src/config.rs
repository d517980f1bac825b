use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Backend API settings
    pub api: ApiConfig,

    /// Weather settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Freshness cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Device geolocation settings
    #[serde(default)]
    pub geolocation: GeolocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base path of the weather backend, e.g. `http://localhost:5000/api/weather`
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

fn default_api_timeout() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api/weather".to_string(),
            timeout_secs: default_api_timeout(),
        }
    }
}

/// A named coordinate pair used as the startup location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for DefaultLocation {
    fn default() -> Self {
        Self {
            name: "São Paulo, SP".to_string(),
            latitude: -23.5505,
            longitude: -46.6333,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Refresh interval in minutes
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u32,

    /// Number of days requested from the forecast endpoint
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,

    /// Location shown at startup
    #[serde(default)]
    pub default_location: DefaultLocation,
}

fn default_refresh_minutes() -> u32 {
    10
}

fn default_forecast_days() -> u32 {
    7
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            refresh_minutes: default_refresh_minutes(),
            forecast_days: default_forecast_days(),
            default_location: DefaultLocation::default(),
        }
    }
}

impl WeatherConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh_minutes) * 60)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    /// Maximum number of cached responses
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_cache_ttl() -> u64 {
    5 * 60
}

fn default_cache_capacity() -> usize {
    50
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            capacity: default_cache_capacity(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Coordinates reported by the fixed geolocation source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedPosition {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default = "default_true")]
    pub high_accuracy: bool,

    #[serde(default = "default_geolocation_timeout")]
    pub timeout_secs: u64,

    /// How old a previously obtained position may be and still be reused
    #[serde(default = "default_geolocation_max_age")]
    pub maximum_age_secs: u64,

    /// When set, geolocation requests resolve to this position.
    /// When absent, geolocation is reported as unsupported.
    #[serde(default)]
    pub fixed_position: Option<FixedPosition>,
}

fn default_true() -> bool {
    true
}

fn default_geolocation_timeout() -> u64 {
    10
}

fn default_geolocation_max_age() -> u64 {
    5 * 60
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_secs: default_geolocation_timeout(),
            maximum_age_secs: default_geolocation_max_age(),
            fixed_position: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clima");

        Self {
            config_dir,
            api: ApiConfig::default(),
            weather: WeatherConfig::default(),
            cache: CacheConfig::default(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults there if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Fails with [`ConfigError::Invalid`] when validation reports errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config_path = Self::config_path()?;
        Self::load_validated_from(&config_path)
    }

    /// [`load_validated`](Self::load_validated) for an explicit path
    pub fn load_validated_from(config_path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(config_path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.api.base_url, "api.base_url", &mut result);

        if self.api.timeout_secs == 0 {
            result.add_error("api.timeout_secs", "Request timeout must be greater than 0");
        }

        if self.weather.refresh_minutes == 0 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh disabled (0 minutes)",
            );
        } else if self.weather.refresh_minutes > 1440 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh interval is more than 24 hours",
            );
        }

        if !(1..=16).contains(&self.weather.forecast_days) {
            result.add_error(
                "weather.forecast_days",
                "Forecast days must be between 1 and 16",
            );
        }

        let default_location = &self.weather.default_location;
        validate_coordinates(
            default_location.latitude,
            default_location.longitude,
            "weather.default_location",
            &mut result,
        );

        if self.cache.capacity == 0 {
            result.add_error("cache.capacity", "Cache capacity must be greater than 0");
        }
        if self.cache.ttl_secs == 0 {
            result.add_warning("cache.ttl_secs", "Cache disabled (0 second TTL)");
        }

        if self.geolocation.timeout_secs == 0 {
            result.add_error(
                "geolocation.timeout_secs",
                "Geolocation timeout must be greater than 0",
            );
        }
        if let Some(position) = self.geolocation.fixed_position {
            validate_coordinates(
                position.latitude,
                position.longitude,
                "geolocation.fixed_position",
                &mut result,
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Directory holding the saved-cities storage
    pub fn storage_dir(&self) -> PathBuf {
        self.config_dir.join("storage")
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("clima");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_coordinates(latitude: f64, longitude: f64, field: &str, result: &mut ValidationResult) {
    if !(-90.0..=90.0).contains(&latitude) {
        result.add_error(field, format!("Latitude out of range: {}", latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        result.add_error(field, format!("Longitude out of range: {}", longitude));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.weather.refresh_interval(), Duration::from_secs(600));
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.api.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "api.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.api.base_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_capacity_is_error() {
        let mut config = Config::default();
        config.cache.capacity = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "cache.capacity"));
    }

    #[test]
    fn test_refresh_disabled_is_warning() {
        let mut config = Config::default();
        config.weather.refresh_minutes = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.refresh_minutes"));
    }

    #[test]
    fn test_out_of_range_default_location() {
        let mut config = Config::default();
        config.weather.default_location.latitude = 123.0;
        let result = config.validate();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_load_from_creates_defaults_then_round_trips_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clima").join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.weather.forecast_days, 7);

        let mut edited = created.clone();
        edited.api.base_url = "https://weather.example.com/api/weather".to_string();
        edited.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api.base_url, "https://weather.example.com/api/weather");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/clima\"\n\n[api]\nbase_url = \"http://localhost:5000/api/weather\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.cache.capacity, 50);
        assert!(config.geolocation.high_accuracy);
        assert!(config.geolocation.fixed_position.is_none());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_invalid_file_is_rejected_with_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/clima\"\n\n[api]\nbase_url = \"ftp://localhost\"\n",
        )
        .unwrap();

        let err = Config::load_validated_from(&path).unwrap_err();
        let Some(ConfigError::Invalid(summary)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected an invalid-config error, got {:?}", err);
        };
        assert!(summary.contains("api.base_url"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}

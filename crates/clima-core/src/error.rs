//! Centralized error types for the Clima dashboard.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling at the controller boundary
//! - Provides user-friendly messages suitable for notifications
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Top-level application error type.
///
/// Every failure that reaches the controller is converted into this type.
/// Use `user_message()` to get a notification-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Well-formed error response from the backend; carries the backend's text.
    #[error("API error: {0}")]
    Api(String),

    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeolocationError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    pub fn api(message: impl Into<String>) -> Self {
        AppError::Api(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        AppError::Storage(message.into())
    }

    /// Returns a user-friendly message suitable for display in a notification.
    ///
    /// Backend and validation messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(e) => e.user_message().to_string(),
            AppError::Api(message) => message.clone(),
            AppError::Geolocation(e) => e.user_message().to_string(),
            AppError::Storage(_) => {
                "Saved cities could not be stored. Changes may not persist.".to_string()
            }
            AppError::Validation(message) => message.clone(),
            AppError::Config(e) => e.user_message().to_string(),
        }
    }
}

/// Network-related errors (HTTP transport, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Device geolocation errors.
#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location request timed out")]
    Timeout,

    #[error("Geolocation is not supported")]
    Unsupported,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

impl GeolocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied => "Location access was denied.",
            GeolocationError::Timeout => "Locating your device took too long.",
            GeolocationError::Unsupported => "Geolocation is not supported on this device.",
            GeolocationError::Unavailable(_) => "Your position is currently unavailable.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::from(NetworkError::Timeout),
            AppError::api("Erro ao obter dados meteorológicos"),
            AppError::from(GeolocationError::PermissionDenied),
            AppError::storage("disk full"),
            AppError::validation("Enter a city name"),
            AppError::from(ConfigError::Invalid("x".into())),
        ];

        for error in errors {
            assert!(!error.user_message().is_empty(), "{:?}", error);
        }
    }

    #[test]
    fn test_api_message_passes_through() {
        let err = AppError::api("Parâmetros lat e lon são obrigatórios");
        assert_eq!(err.user_message(), "Parâmetros lat e lon são obrigatórios");
    }

    #[test]
    fn test_storage_message_hides_details() {
        let err = AppError::storage("permission denied: /root/.config");
        assert!(!err.user_message().contains("/root"));
    }

    #[test]
    fn test_config_error_message() {
        let err = AppError::from(ConfigError::ParseError("expected `]`".into()));
        assert_eq!(
            err.user_message(),
            "Configuration file is malformed. Check your settings."
        );
    }

    #[test]
    fn test_geolocation_conversion() {
        let app_err: AppError = GeolocationError::Timeout.into();
        assert!(matches!(app_err, AppError::Geolocation(GeolocationError::Timeout)));
        assert_eq!(app_err.user_message(), "Locating your device took too long.");
    }
}

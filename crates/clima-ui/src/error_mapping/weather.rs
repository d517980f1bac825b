use clima_core::{AppError, GeolocationError, NetworkError, ReqwestErrorExt};
use clima_weather::{LocationError, WeatherError};

use super::IntoAppError;

impl IntoAppError for WeatherError {
    fn into_app_error(self) -> AppError {
        match self {
            WeatherError::Network(e) => AppError::Network(e.into_network_error()),
            WeatherError::Api(message) => AppError::Api(message),
            WeatherError::Parse(s) => AppError::Network(NetworkError::InvalidResponse(s)),
            WeatherError::Location(e) => e.into_app_error(),
        }
    }
}

impl IntoAppError for LocationError {
    fn into_app_error(self) -> AppError {
        let geo = match self {
            LocationError::PermissionDenied => GeolocationError::PermissionDenied,
            LocationError::Timeout => GeolocationError::Timeout,
            LocationError::Unsupported => GeolocationError::Unsupported,
            LocationError::Other(s) => GeolocationError::Unavailable(s),
        };
        AppError::Geolocation(geo)
    }
}

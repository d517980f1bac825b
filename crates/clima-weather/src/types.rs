use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Coordinate delta below which two locations are the same place (~1 km).
pub const PROXIMITY_DEGREES: f64 = 0.01;

/// Geographic location
///
/// Serialized as `{name, lat, lon}`, the shape used by both the search
/// endpoint and the saved-cities storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// True when both coordinates differ by less than [`PROXIMITY_DEGREES`].
    pub fn is_same_place(&self, other: &Location) -> bool {
        (self.latitude - other.latitude).abs() < PROXIMITY_DEGREES
            && (self.longitude - other.longitude).abs() < PROXIMITY_DEGREES
    }

    /// Coordinates rounded to 4 decimal places, e.g. `-22.9068, -43.1729`
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A search hit as returned by `GET {base}/search`.
///
/// The backend also sends `country` and `admin1`, already folded into `name`;
/// they are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<SearchResult> for Location {
    fn from(result: SearchResult) -> Self {
        Location::new(result.name, result.lat, result.lon)
    }
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: f64,
    /// WMO weather code
    pub weather_code: i32,
    #[serde(default, deserialize_with = "deserialize_optional_local_datetime")]
    pub timestamp: Option<NaiveDateTime>,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub weather_code: i32,
    #[serde(default)]
    pub description: String,
    /// Precipitation sum in mm; missing or null values read as 0
    #[serde(default, deserialize_with = "deserialize_precipitation")]
    pub precipitation: f64,
}

/// Hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourForecast {
    #[serde(deserialize_with = "deserialize_local_datetime")]
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub humidity: f64,
    pub weather_code: i32,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Daily and hourly forecast, in the chronological order the backend sent them
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastBundle {
    #[serde(rename = "daily_forecast", default)]
    pub daily: Vec<DayForecast>,
    #[serde(rename = "hourly_forecast", default)]
    pub hourly: Vec<HourForecast>,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Geolocation is not supported")]
    Unsupported,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather client errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Error reported by the backend, either its `error` field or a fallback text
    #[error("{0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
}

const LOCAL_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parses the backend's local timestamps, which may omit seconds (`2024-01-15T13:00`).
pub fn parse_local_datetime(value: &str) -> Option<NaiveDateTime> {
    LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

fn deserialize_local_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_local_datetime(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn deserialize_optional_local_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_local_datetime))
}

fn deserialize_precipitation<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.unwrap_or(0.0).max(0.0))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_same_place_within_threshold() {
        let a = Location::new("Rio", -22.9068, -43.1729);
        let b = Location::new("Rio de Janeiro", -22.9100, -43.1700);
        assert!(a.is_same_place(&b));
        assert!(b.is_same_place(&a));
    }

    #[test]
    fn test_same_place_requires_both_coordinates() {
        let a = Location::new("A", 10.0, 20.0);
        let lat_far = Location::new("B", 10.02, 20.0);
        let lon_far = Location::new("C", 10.0, 20.02);
        assert!(!a.is_same_place(&lat_far));
        assert!(!a.is_same_place(&lon_far));
    }

    #[test]
    fn test_same_place_is_strict() {
        let a = Location::new("A", 0.0, 0.0);
        let b = Location::new("B", 0.5, 0.0);
        let c = Location::new("C", 0.25, 0.25);
        assert!(!a.is_same_place(&b));
        assert!(!a.is_same_place(&c));
        assert!(a.is_same_place(&Location::new("D", 0.005, -0.005)));
    }

    #[test]
    fn test_location_wire_format() {
        let loc = Location::new("Recife", -8.0476, -34.877);
        let json = serde_json::to_string(&loc).unwrap();
        assert_eq!(json, r#"{"name":"Recife","lat":-8.0476,"lon":-34.877}"#);
    }

    #[test]
    fn test_format_coordinates() {
        let loc = Location::new("São Paulo", -23.55052, -46.633308);
        assert_eq!(loc.format_coordinates(), "-23.5505, -46.6333");
    }

    #[test]
    fn test_search_result_into_location() {
        let result: SearchResult = serde_json::from_value(serde_json::json!({
            "name": "Rio de Janeiro, Rio de Janeiro, Brasil",
            "lat": -22.90642,
            "lon": -43.18223,
            "country": "Brasil",
            "admin1": "Rio de Janeiro"
        }))
        .unwrap();
        let location = Location::from(result);
        assert_eq!(location.name, "Rio de Janeiro, Rio de Janeiro, Brasil");
        assert_eq!(location.latitude, -22.90642);
    }

    #[test]
    fn test_forecast_bundle_preserves_order_and_formats() {
        let bundle: ForecastBundle = serde_json::from_value(serde_json::json!({
            "location": "Recife",
            "latitude": -8.05,
            "longitude": -34.88,
            "daily_forecast": [
                {"date": "2024-01-16", "temperature_max": 31.2, "temperature_min": 24.0,
                 "weather_code": 3, "precipitation": null, "description": "Overcast"},
                {"date": "2024-01-15", "temperature_max": 30.1, "temperature_min": 23.4,
                 "weather_code": 61, "precipitation": 2.5, "description": "Slight rain"}
            ],
            "hourly_forecast": [
                {"time": "2024-01-15T00:00", "temperature": 25.1, "humidity": 80,
                 "wind_speed": 9.4, "weather_code": 1, "description": "Mainly clear"},
                {"time": "2024-01-15T01:00:00", "temperature": 24.8, "humidity": 82,
                 "weather_code": 2}
            ]
        }))
        .unwrap();

        assert_eq!(bundle.daily.len(), 2);
        assert_eq!(bundle.daily[0].date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        assert_eq!(bundle.daily[0].precipitation, 0.0);
        assert_eq!(bundle.daily[1].precipitation, 2.5);
        assert_eq!(bundle.hourly[1].time.format("%H:%M").to_string(), "01:00");
        assert_eq!(bundle.hourly[0].wind_speed, Some(9.4));
        assert!(bundle.hourly[1].description.is_none());
    }

    #[test]
    fn test_current_conditions_timestamp_is_optional() {
        let current: CurrentConditions = serde_json::from_value(serde_json::json!({
            "location": "Recife",
            "latitude": -8.05,
            "longitude": -34.88,
            "temperature": 29.4,
            "humidity": 74,
            "wind_speed": 14.2,
            "wind_direction": 120,
            "weather_code": 2,
            "description": "Partly cloudy"
        }))
        .unwrap();
        assert!(current.timestamp.is_none());
        assert_eq!(current.humidity, 74.0);
    }

    #[test]
    fn test_parse_local_datetime_rejects_garbage() {
        assert!(parse_local_datetime("yesterday").is_none());
        assert!(parse_local_datetime("2024-01-15T13:00:00.123456").is_some());
    }
}

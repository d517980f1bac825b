//! HTTP client for the Clima weather backend.
//!
//! The backend wraps every payload as `{"data": ...}` and reports failures
//! as `{"error": "..."}` with a non-2xx status.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::cache::{current_key, forecast_key, CachedPayload, FreshnessCache};
use crate::types::{CurrentConditions, ForecastBundle, Location, SearchResult, WeatherError};

const USER_AGENT: &str = concat!("Clima/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_FORECAST_DAYS: u32 = 7;

const CURRENT_FALLBACK: &str = "Failed to load current weather";
const FORECAST_FALLBACK: &str = "Failed to load forecast";
const SEARCH_FALLBACK: &str = "City search failed";

/// Weather data source used by the dashboard controller.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    async fn fetch_current(&self, location: &Location) -> Result<CurrentConditions, WeatherError>;

    async fn fetch_forecast(
        &self,
        location: &Location,
        days: u32,
    ) -> Result<ForecastBundle, WeatherError>;

    /// Possibly empty list of matching cities.
    async fn search_cities(&self, query: &str) -> Result<Vec<Location>, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    client: Client,
    base_url: String,
    cache: Arc<Mutex<FreshnessCache<CachedPayload>>>,
}

impl WeatherApiClient {
    pub fn new(base_url: &str) -> Result<Self, WeatherError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: Arc::new(Mutex::new(FreshnessCache::default())),
        })
    }

    /// Replace the response cache, e.g. with a configured TTL/capacity.
    pub fn with_cache(mut self, cache: FreshnessCache<CachedPayload>) -> Self {
        self.cache = Arc::new(Mutex::new(cache));
        self
    }

    fn cached(&self, key: &str) -> Option<CachedPayload> {
        let hit = self.cache.lock().get(key);
        if hit.is_some() {
            tracing::debug!("Cache hit for {}", key);
        } else {
            tracing::debug!("Cache miss for {}", key);
        }
        hit
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        fallback: &str,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!("GET {} {:?}", url, query);

        let response = self.client.get(&url).query(query).send().await?;
        handle_response(response, fallback).await
    }
}

#[async_trait]
impl WeatherApi for WeatherApiClient {
    #[instrument(skip(self, location), fields(location = %location.name))]
    async fn fetch_current(&self, location: &Location) -> Result<CurrentConditions, WeatherError> {
        let key = current_key(location);
        if let Some(CachedPayload::Current(current)) = self.cached(&key) {
            return Ok(current);
        }

        let query = [
            ("lat", location.latitude.to_string()),
            ("lon", location.longitude.to_string()),
            ("location", location.name.clone()),
        ];
        let current: CurrentConditions = self.get("current", &query, CURRENT_FALLBACK).await?;

        self.cache
            .lock()
            .put(key, CachedPayload::Current(current.clone()));
        Ok(current)
    }

    #[instrument(skip(self, location), fields(location = %location.name))]
    async fn fetch_forecast(
        &self,
        location: &Location,
        days: u32,
    ) -> Result<ForecastBundle, WeatherError> {
        let key = forecast_key(location, days);
        if let Some(CachedPayload::Forecast(bundle)) = self.cached(&key) {
            return Ok(bundle);
        }

        let query = [
            ("lat", location.latitude.to_string()),
            ("lon", location.longitude.to_string()),
            ("location", location.name.clone()),
            ("days", days.to_string()),
        ];
        let bundle: ForecastBundle = self.get("forecast", &query, FORECAST_FALLBACK).await?;

        self.cache
            .lock()
            .put(key, CachedPayload::Forecast(bundle.clone()));
        Ok(bundle)
    }

    #[instrument(skip(self))]
    async fn search_cities(&self, query: &str) -> Result<Vec<Location>, WeatherError> {
        let params = [("q", query.to_string())];
        let results: Vec<SearchResult> = self.get("search", &params, SEARCH_FALLBACK).await?;
        tracing::debug!("Search for {:?} returned {} cities", query, results.len());
        Ok(results.into_iter().map(Location::from).collect())
    }
}

/// Unwraps the `{data}` / `{error}` envelope.
///
/// An `error` field always wins. A non-2xx status without one yields the
/// per-operation fallback message.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback: &str,
) -> Result<T, WeatherError> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<ApiEnvelope<T>>(&body) {
        Ok(ApiEnvelope {
            error: Some(message),
            ..
        }) => Err(WeatherError::Api(message)),
        Ok(_) if !status.is_success() => Err(WeatherError::Api(fallback.to_string())),
        Ok(ApiEnvelope { data: Some(data), .. }) => Ok(data),
        Ok(ApiEnvelope { data: None, .. }) => Err(WeatherError::Parse(
            "response is missing the data field".to_string(),
        )),
        Err(_) if !status.is_success() => {
            tracing::debug!("Unparseable {} response: {}", status, body);
            Err(WeatherError::Api(fallback.to_string()))
        }
        Err(e) => Err(WeatherError::Parse(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn recife() -> Location {
        Location::new("Recife", -8.05, -34.9)
    }

    fn current_body() -> serde_json::Value {
        serde_json::json!({
            "data": {
                "location": "Recife",
                "latitude": -8.05,
                "longitude": -34.9,
                "temperature": 29.4,
                "humidity": 74,
                "wind_speed": 14.2,
                "wind_direction": 120,
                "weather_code": 2,
                "description": "Partly cloudy",
                "timestamp": "2024-01-15T13:00"
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_current_sends_coordinates() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .and(query_param("lat", "-8.05"))
            .and(query_param("lon", "-34.9"))
            .and(query_param("location", "Recife"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = WeatherApiClient::new(&mock_server.uri()).unwrap();
        let current = client.fetch_current(&recife()).await.unwrap();

        assert_eq!(current.location, "Recife");
        assert_eq!(current.weather_code, 2);
        assert!(current.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_fetch_current_is_cached() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = WeatherApiClient::new(&mock_server.uri()).unwrap();
        client.fetch_current(&recife()).await.unwrap();
        client.fetch_current(&recife()).await.unwrap();

        assert_eq!(client.cache.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_forecast_cache_key_includes_days() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"daily_forecast": [], "hourly_forecast": []}
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = WeatherApiClient::new(&mock_server.uri()).unwrap();
        client.fetch_forecast(&recife(), 7).await.unwrap();
        client.fetch_forecast(&recife(), 7).await.unwrap();
        client.fetch_forecast(&recife(), 3).await.unwrap();
    }

    #[tokio::test]
    async fn test_error_field_becomes_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "Erro ao obter dados meteorológicos"
            })))
            .mount(&mock_server)
            .await;

        let client = WeatherApiClient::new(&mock_server.uri()).unwrap();
        let err = client.fetch_current(&recife()).await.unwrap_err();

        match err {
            WeatherError::Api(message) => assert_eq!(message, "Erro ao obter dados meteorológicos"),
            other => panic!("expected Api error, got {:?}", other),
        }
        assert_eq!(client.cache.lock().len(), 0);
    }

    #[tokio::test]
    async fn test_status_without_error_field_uses_fallback() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let client = WeatherApiClient::new(&mock_server.uri()).unwrap();
        let err = client.fetch_forecast(&recife(), 7).await.unwrap_err();

        assert!(matches!(err, WeatherError::Api(ref m) if m == "Failed to load forecast"));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = WeatherApiClient::new(&mock_server.uri()).unwrap();
        let err = client.fetch_current(&recife()).await.unwrap_err();

        assert!(matches!(err, WeatherError::Parse(_)));
    }

    #[tokio::test]
    async fn test_search_cities() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Rio de Janeiro"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "name": "Rio de Janeiro, Rio de Janeiro, Brasil",
                    "lat": -22.90642,
                    "lon": -43.18223,
                    "country": "Brasil",
                    "admin1": "Rio de Janeiro"
                }]
            })))
            .mount(&mock_server)
            .await;

        let client = WeatherApiClient::new(&format!("{}/", mock_server.uri())).unwrap();
        let cities = client.search_cities("Rio de Janeiro").await.unwrap();

        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "Rio de Janeiro, Rio de Janeiro, Brasil");
        assert_eq!(client.cache.lock().len(), 0);
    }

    #[tokio::test]
    async fn test_search_failure_fallback() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = WeatherApiClient::new(&mock_server.uri()).unwrap();
        let err = client.search_cities("x").await.unwrap_err();

        assert_eq!(err.to_string(), "City search failed");
    }
}

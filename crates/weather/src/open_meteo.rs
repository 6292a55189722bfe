//! Open-Meteo current-conditions client.
//!
//! `GET {api_url}/v1/forecast?latitude=..&longitude=..&current=...&timezone=auto`
//! returns `{"current": {"temperature_2m", "relative_humidity_2m",
//! "weather_code", "wind_speed_10m"}}`. No API key is required.

use crate::report::condition_label;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use wardrobe_config::WeatherConfig;
use wardrobe_core::error::WeatherError;
use wardrobe_core::weather::{Location, WeatherSnapshot, WeatherSource};

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m";

pub struct OpenMeteoClient {
    client: reqwest::Client,
    api_url: String,
}

impl OpenMeteoClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Network(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Self::new(
            config.api_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn forecast_url(&self) -> String {
        format!("{}/v1/forecast", self.api_url)
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    fn name(&self) -> &str {
        "open-meteo"
    }

    async fn current(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        if !location.is_valid() {
            return Err(WeatherError::InvalidCoordinates {
                latitude: location.latitude,
                longitude: location.longitude,
            });
        }

        let response = self
            .client
            .get(self.forecast_url())
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status {
                status_code: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::Network(e.to_string()))?;
        let snapshot = parse_current(&body, &location.label)?;
        debug!(
            location = %location.label,
            temperature = snapshot.temperature,
            condition = %snapshot.condition,
            "Fetched current weather"
        );
        Ok(snapshot)
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    #[serde(default)]
    relative_humidity_2m: Option<f64>,
    #[serde(default)]
    weather_code: Option<u16>,
    #[serde(default)]
    wind_speed_10m: Option<f64>,
}

/// Parse a forecast body into a snapshot. Temperature is rounded to whole
/// degrees; a missing weather code reads as the fallback condition.
pub fn parse_current(body: &str, location_label: &str) -> Result<WeatherSnapshot, WeatherError> {
    let forecast: ForecastResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::InvalidPayload(e.to_string()))?;
    let current = forecast.current;

    let condition = current
        .weather_code
        .map(condition_label)
        .unwrap_or(crate::report::FALLBACK_CONDITION);

    let mut snapshot = WeatherSnapshot::new(current.temperature_2m.round(), condition, location_label);
    snapshot.humidity_pct = current.relative_humidity_2m;
    snapshot.wind_speed_kmh = current.wind_speed_10m;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::Query;
    use axum::routing::get;
    use std::collections::HashMap;

    const BODY: &str = r#"{
        "latitude": 31.25, "longitude": 121.5,
        "current": {
            "time": "2026-03-01T10:00",
            "temperature_2m": 12.6,
            "relative_humidity_2m": 81,
            "weather_code": 61,
            "wind_speed_10m": 9.4
        }
    }"#;

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn parses_and_rounds() {
        let snapshot = parse_current(BODY, "Shanghai").unwrap();
        assert_eq!(snapshot.temperature, 13.0);
        assert_eq!(snapshot.condition, "light rain");
        assert_eq!(snapshot.location_label, "Shanghai");
        assert_eq!(snapshot.humidity_pct, Some(81.0));
        assert_eq!(snapshot.wind_speed_kmh, Some(9.4));
    }

    #[test]
    fn unmapped_code_reads_cloudy() {
        let body = r#"{"current": {"temperature_2m": -0.4, "weather_code": 42}}"#;
        let snapshot = parse_current(body, "Oslo").unwrap();
        assert_eq!(snapshot.condition, "cloudy");
        assert_eq!(snapshot.temperature, 0.0);
        assert!(snapshot.humidity_pct.is_none());
    }

    #[test]
    fn missing_current_block_is_invalid_payload() {
        let err = parse_current(r#"{"error": true, "reason": "bad"}"#, "x").unwrap_err();
        assert!(matches!(err, WeatherError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn fetches_from_forecast_endpoint() {
        let app = Router::new().route(
            "/v1/forecast",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("latitude").map(String::as_str), Some("31.23"));
                assert_eq!(params.get("longitude").map(String::as_str), Some("121.47"));
                assert_eq!(params.get("current").map(String::as_str), Some(CURRENT_FIELDS));
                assert_eq!(params.get("timezone").map(String::as_str), Some("auto"));
                BODY
            }),
        );
        let base = spawn_server(app).await;
        let client = OpenMeteoClient::new(base, Duration::from_secs(5)).unwrap();

        let snapshot = client
            .current(&Location::new(31.23, 121.47, "Shanghai"))
            .await
            .unwrap();
        assert_eq!(snapshot.condition, "light rain");
        assert_eq!(snapshot.temperature, 13.0);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let app = Router::new().route(
            "/v1/forecast",
            get(|| async { (axum::http::StatusCode::BAD_REQUEST, "nope") }),
        );
        let base = spawn_server(app).await;
        let client = OpenMeteoClient::new(base, Duration::from_secs(5)).unwrap();
        let err = client
            .current(&Location::new(0.0, 0.0, "Null Island"))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::Status { status_code: 400 }));
    }

    #[tokio::test]
    async fn invalid_coordinates_rejected_without_request() {
        let client = OpenMeteoClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client
            .current(&Location::new(120.0, 0.0, "nowhere"))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::InvalidCoordinates { .. }));
    }
}

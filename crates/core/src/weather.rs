//! Weather snapshot and the source trait that produces it.

use crate::error::WeatherError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Current conditions at one location. Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Short label such as "light rain".
    pub condition: String,
    pub location_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_kmh: Option<f64>,
}

impl WeatherSnapshot {
    pub fn new(
        temperature: f64,
        condition: impl Into<String>,
        location_label: impl Into<String>,
    ) -> Self {
        Self {
            temperature,
            condition: condition.into(),
            location_label: location_label.into(),
            humidity_pct: None,
            wind_speed_kmh: None,
        }
    }
}

/// A coordinate plus the label shown to the user and the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, label: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            label: label.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Anything that can report current weather for a location.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    fn name(&self) -> &str;

    async fn current(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError>;
}

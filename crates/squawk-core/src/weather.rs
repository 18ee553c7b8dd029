//! Weather lookup capability.
//!
//! Used by the `weather` command; `squawk-transport` implements it over the
//! OpenWeather HTTP API.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Errors from a weather lookup.
#[derive(Debug, Clone, Error)]
pub enum WeatherError {
    /// The service answered with an error, e.g. an unknown city.
    #[error("{0}")]
    Api(String),

    /// The service could not be reached.
    #[error("weather request failed: {0}")]
    Network(String),

    /// The service answered with something unreadable.
    #[error("malformed weather response: {0}")]
    Malformed(String),
}

/// Measurement system of a [`WeatherReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Celsius and metres per second.
    #[default]
    Metric,
    /// Fahrenheit and miles per hour.
    Imperial,
    /// Kelvin and metres per second.
    Standard,
}

impl Units {
    /// Returns the name the OpenWeather API uses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }

    fn temperature_suffix(&self) -> &'static str {
        match self {
            Self::Metric => "C",
            Self::Imperial => "F",
            Self::Standard => "K",
        }
    }

    fn speed_suffix(&self) -> &'static str {
        match self {
            Self::Imperial => "mph",
            Self::Metric | Self::Standard => "m/s",
        }
    }
}

/// Current conditions in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// City name as resolved by the service.
    pub city: String,
    /// Country code.
    pub country: String,
    /// Short description, e.g. "light rain".
    pub description: String,
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity in percent.
    pub humidity: u8,
    pub wind_speed: f64,
    pub units: Units,
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.units.temperature_suffix();
        write!(
            f,
            "{}, {}: {}, {}{t}, feels like {}{t}, {}% humidity, wind speed {}{}",
            self.city,
            self.country,
            self.description,
            self.temperature.round() as i64,
            self.feels_like.round() as i64,
            self.humidity,
            self.wind_speed,
            self.units.speed_suffix(),
        )
    }
}

/// Source of current weather conditions.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Looks up the current conditions in `city`.
    async fn current(&self, city: &str) -> Result<WeatherReport, WeatherError>;
}

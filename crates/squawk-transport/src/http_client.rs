//! OpenWeather HTTP client implementing the weather capability.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use squawk_core::{Units, WeatherError, WeatherProvider, WeatherReport};

/// Current-weather endpoint of the OpenWeather API.
pub const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Settings of an [`OpenWeatherClient`].
#[derive(Debug, Clone)]
pub struct OpenWeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub units: Units,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl OpenWeatherConfig {
    /// Creates a config for the public API with metric units.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENWEATHER_URL.to_string(),
            units: Units::Metric,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Looks up current weather through the OpenWeather API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    config: OpenWeatherConfig,
}

impl OpenWeatherClient {
    /// Builds the HTTP client.
    pub fn new(config: OpenWeatherConfig) -> Result<Self, WeatherError> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WeatherError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self, city: &str) -> Result<Url, WeatherError> {
        Url::parse_with_params(
            &self.config.base_url,
            &[
                ("q", city),
                ("appid", self.config.api_key.as_str()),
                ("units", self.config.units.as_str()),
            ],
        )
        .map_err(|e| WeatherError::Network(format!("invalid weather URL: {e}")))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        debug!(city = %city, "Requesting current weather");

        let body: Value = self
            .client
            .get(self.url(city)?)
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.to_string()))?
            .json()
            .await
            .map_err(|e| WeatherError::Malformed(e.to_string()))?;

        parse_response(body, self.config.units)
    }
}

#[derive(Deserialize)]
struct Response {
    name: String,
    sys: Sys,
    weather: Vec<Condition>,
    main: Main,
    wind: Wind,
}

#[derive(Deserialize)]
struct Sys {
    #[serde(default)]
    country: String,
}

#[derive(Deserialize)]
struct Condition {
    description: String,
}

#[derive(Deserialize)]
struct Main {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Deserialize)]
struct Wind {
    speed: f64,
}

/// Turns an API answer into a report.
///
/// The API signals errors in the body: `cod` is `200` on success and an
/// error code (sometimes as a string) next to a `message` otherwise.
fn parse_response(body: Value, units: Units) -> Result<WeatherReport, WeatherError> {
    let code = match &body["cod"] {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    if code != Some(200) {
        let reason = body["message"]
            .as_str()
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("unexpected response code {}", body["cod"]));
        return Err(WeatherError::Api(reason));
    }

    let response: Response =
        serde_json::from_value(body).map_err(|e| WeatherError::Malformed(e.to_string()))?;
    let description = response
        .weather
        .into_iter()
        .next()
        .map(|c| c.description)
        .ok_or_else(|| WeatherError::Malformed("no weather conditions".to_string()))?;

    Ok(WeatherReport {
        city: response.name,
        country: response.sys.country,
        description,
        temperature: response.main.temp,
        feels_like: response.main.feels_like,
        humidity: response.main.humidity,
        wind_speed: response.wind.speed,
        units,
    })
}

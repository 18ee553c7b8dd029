//! `weather`: current conditions for a city.
//!
//! The lookup itself goes through a [`WeatherProvider`]; `squawk-transport`
//! ships one backed by the OpenWeather HTTP API.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use squawk_core::{Message, WeatherError, WeatherProvider};
use tracing::warn;

use super::usage;
use crate::command::Command;
use crate::context::BotContext;
use crate::error::CommandResult;

// =============================================================================
// Command
// =============================================================================

/// Replies with the weather in the city named by the arguments.
///
/// Errors reported by the service are relayed to the chat; connection
/// problems are only logged.
#[derive(Clone)]
pub struct Weather {
    provider: Arc<dyn WeatherProvider>,
}

impl Weather {
    /// Creates the command over a provider.
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }
}

impl fmt::Debug for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weather").finish_non_exhaustive()
    }
}

#[async_trait]
impl Command for Weather {
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
        let city = message.joined_args();
        if city.is_empty() {
            return usage(ctx, message, "<city>").await;
        }

        match self.provider.current(&city).await {
            Ok(report) => ctx.reply(message, &report.to_string()).await?,
            Err(WeatherError::Api(reason)) => {
                let text = format!("Error while getting weather! {reason}");
                ctx.reply(message, &text).await?;
            }
            Err(err) => warn!(city = %city, error = %err, "Error while getting weather"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use squawk_core::{Units, WeatherReport};

    use super::*;
    use crate::builtin::harness::Harness;
    use crate::command::CommandRegistry;

    struct Fixed(Result<WeatherReport, WeatherError>);

    #[async_trait]
    impl WeatherProvider for Fixed {
        async fn current(&self, _city: &str) -> Result<WeatherReport, WeatherError> {
            self.0.clone()
        }
    }

    fn report() -> WeatherReport {
        WeatherReport {
            city: "Amsterdam".into(),
            country: "NL".into(),
            description: "light rain".into(),
            temperature: 11.6,
            feels_like: 10.2,
            humidity: 87,
            wind_speed: 5.14,
            units: Units::Metric,
        }
    }

    async fn harness(result: Result<WeatherReport, WeatherError>) -> Harness {
        let registry = CommandRegistry::new().with("weather", Weather::new(Arc::new(Fixed(result))));
        Harness::new(json!({}), registry).await
    }

    #[tokio::test]
    async fn test_weather_reply() {
        let mut h = harness(Ok(report())).await;
        assert_eq!(
            h.run("!weather Amsterdam").await,
            ["PRIVMSG #bob :Amsterdam, NL: light rain, 12C, feels like 10C, 87% humidity, wind speed 5.14m/s"]
        );
    }

    #[tokio::test]
    async fn test_api_error_is_relayed() {
        let mut h = harness(Err(WeatherError::Api("city not found".into()))).await;
        assert_eq!(
            h.run("!weather Atlantis").await,
            ["PRIVMSG #bob :Error while getting weather! city not found"]
        );
    }

    #[tokio::test]
    async fn test_network_error_is_silent() {
        let mut h = harness(Err(WeatherError::Network("timed out".into()))).await;
        assert!(h.run("!weather Amsterdam").await.is_empty());
    }

    #[tokio::test]
    async fn test_weather_usage() {
        let mut h = harness(Ok(report())).await;
        assert_eq!(h.run("!weather").await, ["PRIVMSG #bob :@bob Usage: !weather <city>"]);
    }
}

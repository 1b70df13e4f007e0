use crate::{
    Config, CurrentConditions, Forecast, UnitSystem, provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of weather readings for a named location.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, location: &str, unit: UnitSystem) -> anyhow::Result<CurrentConditions>;

    /// 3-hour samples covering the next several days.
    async fn forecast(&self, location: &str, unit: UnitSystem) -> anyhow::Result<Forecast>;
}

/// Construct the OpenWeather provider with the credential resolved from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    Ok(Box::new(OpenWeatherProvider::new(api_key)))
}

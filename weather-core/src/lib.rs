//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Day-bucketed forecast aggregation and its chronological rendering
//! - Formatting of current-conditions readings
//! - Configuration & credentials handling
//! - Abstraction over the weather provider (OpenWeather)
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod current;
pub mod error;
pub mod forecast;
pub mod model;
pub mod provider;

pub use config::Config;
pub use current::format_current;
pub use error::WeatherError;
pub use forecast::{aggregate, render};
pub use model::{
    CurrentConditions, DayKey, DaySummary, Forecast, ForecastSample, UnitSystem,
    normalize_location,
};
pub use provider::{WeatherProvider, provider_from_config};

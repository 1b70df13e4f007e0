use anyhow::{Context, Result};
use inquire::{Password, Select, Text};
use std::fmt;

use weather_core::UnitSystem;

/// What the interactive menu can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Current,
    Forecast,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Current => f.write_str("Current Weather"),
            Report::Forecast => f.write_str("5-Day Forecast"),
        }
    }
}

/// Terminal questions asked by the CLI.
pub trait Prompter {
    fn city(&self) -> Result<String>;
    fn report(&self) -> Result<Report>;
    fn units(&self) -> Result<UnitSystem>;
    fn api_key(&self) -> Result<String>;
}

#[derive(Debug, Default)]
pub struct InquirePrompter;

impl InquirePrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for InquirePrompter {
    fn city(&self) -> Result<String> {
        Text::new("Enter a city name to get weather info for it:")
            .prompt()
            .context("Failed to read city name")
    }

    fn report(&self) -> Result<Report> {
        Select::new("Choose an option:", vec![Report::Current, Report::Forecast])
            .prompt()
            .context("Failed to read menu choice")
    }

    fn units(&self) -> Result<UnitSystem> {
        Select::new("Choose a unit system:", UnitSystem::all().to_vec())
            .prompt()
            .context("Failed to read unit system")
    }

    fn api_key(&self) -> Result<String> {
        Password::new("OpenWeather API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")
    }
}

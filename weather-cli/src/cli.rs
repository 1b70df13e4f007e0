use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use weather_core::{
    Config, UnitSystem, WeatherError, WeatherProvider, aggregate, format_current,
    normalize_location, provider_from_config, render,
};

use crate::{
    logging::DEFAULT_LOG_FILE,
    prompt::{Prompter, Report},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather and 5-day forecasts")]
pub struct Cli {
    /// Unit system: "metric" or "imperial". Defaults to the configured one.
    #[arg(long, global = true, value_parser = parse_units)]
    pub units: Option<UnitSystem>,

    /// Config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// File that receives the diagnostic log.
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Without a command, asks for a city and what to show.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and default unit system.
    Configure,

    /// Show current conditions for a city.
    Current {
        /// City name; prompted for when absent.
        city: Option<String>,
    },

    /// Show the 5-day forecast for a city.
    Forecast {
        /// City name; prompted for when absent.
        city: Option<String>,
    },
}

fn parse_units(value: &str) -> Result<UnitSystem, WeatherError> {
    value.parse()
}

/// What one non-configure run will fetch and show.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub report: Report,
    pub city: String,
    pub units: UnitSystem,
}

impl Cli {
    pub async fn run(self, prompter: &dyn Prompter, out: &mut dyn Write) -> Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        if let Some(Command::Configure) = self.command {
            // A broken file must not block the command that rewrites it.
            let config = Config::load_from(&config_path).unwrap_or_else(|err| {
                warn!(error = %format!("{err:#}"), "Ignoring unreadable configuration");
                Config::default()
            });
            return configure(config, &config_path, prompter, out);
        }

        let config = Config::load_from(&config_path)?;
        let plan = plan(self.command, self.units, config.units, prompter)?;
        let provider = provider_from_config(&config)?;

        match plan.report {
            Report::Current => {
                show_current(provider.as_ref(), &plan.city, plan.units, &Local, out).await
            }
            Report::Forecast => {
                show_forecast(provider.as_ref(), &plan.city, plan.units, &Local, out).await
            }
        }
    }
}

/// Resolve report, city and units from arguments, config and prompts.
///
/// Units come from the flag, then the config file; only the interactive
/// flow asks for them, otherwise metric is used.
pub fn plan(
    command: Option<Command>,
    units_flag: Option<UnitSystem>,
    configured_units: Option<UnitSystem>,
    prompter: &dyn Prompter,
) -> Result<Plan> {
    let interactive = command.is_none();

    let (report, city) = match command {
        Some(Command::Current { city }) => (Report::Current, city),
        Some(Command::Forecast { city }) => (Report::Forecast, city),
        Some(Command::Configure) | None => {
            // City first, then the menu.
            let city = normalize_location(&prompter.city()?)?;
            let report = prompter.report()?;
            (report, Some(city))
        }
    };

    let city = match city {
        Some(city) => normalize_location(&city)?,
        None => normalize_location(&prompter.city()?)?,
    };

    let units = match (units_flag, configured_units) {
        (Some(units), _) | (None, Some(units)) => units,
        (None, None) if interactive => prompter.units()?,
        (None, None) => UnitSystem::default(),
    };

    Ok(Plan { report, city, units })
}

fn configure(
    mut config: Config,
    path: &Path,
    prompter: &dyn Prompter,
    out: &mut dyn Write,
) -> Result<()> {
    let api_key = prompter.api_key()?;
    if api_key.trim().is_empty() {
        return Err(WeatherError::MissingApiKey.into());
    }

    config.set_api_key(api_key.trim().to_string());
    config.set_units(prompter.units()?);

    config.save_to(path)?;
    info!(path = %path.display(), "Saved configuration");
    writeln!(out, "Configuration saved to {}", path.display())?;

    Ok(())
}

/// Fetch and print current conditions for `city`, sun times in `tz`.
pub async fn show_current<Tz>(
    provider: &dyn WeatherProvider,
    city: &str,
    units: UnitSystem,
    tz: &Tz,
    out: &mut dyn Write,
) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    info!(city, %units, "Fetching current weather");

    let reading = provider
        .current(city, units)
        .await
        .with_context(|| format!("Error fetching weather for {city}"))?;

    writeln!(out, "\nWeather Data for {city}")?;
    for line in format_current(&reading, units, tz) {
        writeln!(out, "{line}")?;
    }

    info!(city, "Displayed current weather");
    Ok(())
}

/// Fetch the forecast for `city` and print one line per day of `tz`.
pub async fn show_forecast<Tz: TimeZone>(
    provider: &dyn WeatherProvider,
    city: &str,
    units: UnitSystem,
    tz: &Tz,
    out: &mut dyn Write,
) -> Result<()> {
    info!(city, %units, "Fetching forecast");

    let forecast = provider
        .forecast(city, units)
        .await
        .with_context(|| format!("Error fetching forecast for {city}"))?;

    let days = aggregate(&forecast.samples, tz);
    let lines = render(&days, units);

    writeln!(out, "\n5-Day Forecast for {city}")?;
    for line in &lines {
        writeln!(out, "{line}")?;
    }

    info!(city, days = lines.len(), "Displayed forecast");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset, Utc};
    use weather_core::{CurrentConditions, Forecast, ForecastSample};

    #[derive(Debug)]
    struct FakeProvider {
        fail: bool,
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, day, hour, 0, 0).unwrap()
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn current(&self, location: &str, _unit: UnitSystem) -> Result<CurrentConditions> {
            if self.fail {
                anyhow::bail!(WeatherError::RequestFailed { status: 404, body: "city not found".into() });
            }
            Ok(CurrentConditions {
                location: location.to_string(),
                temperature: 20.0,
                feels_like: 19.5,
                humidity_pct: 40,
                wind_speed: 3.0,
                visibility_m: Some(8000.0),
                sunrise: at(5, 6),
                sunset: at(5, 17),
            })
        }

        async fn forecast(&self, location: &str, _unit: UnitSystem) -> Result<Forecast> {
            if self.fail {
                anyhow::bail!("connection refused");
            }
            let sample = |ts, temp_min, temp_max, condition: &str| ForecastSample {
                timestamp: ts,
                temp_min,
                temp_max,
                condition: condition.to_string(),
            };
            Ok(Forecast {
                location: location.to_string(),
                samples: vec![
                    sample(at(6, 0), 4.0, 9.0, "overcast clouds"),
                    sample(at(5, 21), 10.0, 15.0, "clear sky"),
                    sample(at(5, 0), 8.0, 18.0, "light rain"),
                ],
            })
        }
    }

    #[tokio::test]
    async fn forecast_is_printed_in_date_order() {
        let mut out = Vec::new();
        show_forecast(&FakeProvider { fail: false }, "London", UnitSystem::Metric, &Utc, &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "5-Day Forecast for London");
        assert_eq!(lines[2], "Tue Nov 05 - High: 18.0°C, Low: 8.0°C, clear sky");
        assert_eq!(lines[3], "Wed Nov 06 - High: 9.0°C, Low: 4.0°C, overcast clouds");
        assert_eq!(lines.len(), 4);
    }

    #[tokio::test]
    async fn forecast_days_follow_the_given_zone() {
        let plus_fourteen = FixedOffset::east_opt(14 * 3600).unwrap();

        let mut out = Vec::new();
        show_forecast(&FakeProvider { fail: false }, "Tarawa", UnitSystem::Metric, &plus_fourteen, &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().skip(2).collect();

        assert_eq!(
            lines,
            vec![
                "Tue Nov 05 - High: 18.0°C, Low: 8.0°C, light rain",
                "Wed Nov 06 - High: 15.0°C, Low: 4.0°C, overcast clouds",
            ]
        );
    }

    #[tokio::test]
    async fn current_weather_is_printed_with_units() {
        let mut out = Vec::new();
        show_current(&FakeProvider { fail: false }, "Boston", UnitSystem::Imperial, &Utc, &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Weather Data for Boston"));
        assert!(text.contains("Temperature: 20.00°F"));
        assert!(text.contains("Wind Speed: 3.00 mph"));
        assert!(text.contains("Visibility: 4.97 miles"));
    }

    #[tokio::test]
    async fn provider_failures_are_reported_with_context() {
        let mut out = Vec::new();
        let err = show_current(&FakeProvider { fail: true }, "Nowhere", UnitSystem::Metric, &Utc, &mut out)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Error fetching weather for Nowhere"));
        assert!(matches!(
            err.root_cause().downcast_ref::<WeatherError>(),
            Some(WeatherError::RequestFailed { status: 404, .. })
        ));
        assert!(out.is_empty());

        let err = show_forecast(&FakeProvider { fail: true }, "Nowhere", UnitSystem::Metric, &Utc, &mut out)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("connection refused"));
    }

    /// Answers prompts from fixed values and counts how often it was asked.
    #[derive(Default)]
    struct ScriptedPrompter {
        city: String,
        report: Option<Report>,
        units: Option<UnitSystem>,
        api_key: String,
        asked: std::cell::Cell<usize>,
    }

    impl ScriptedPrompter {
        fn ask(&self) {
            self.asked.set(self.asked.get() + 1);
        }
    }

    impl Prompter for ScriptedPrompter {
        fn city(&self) -> Result<String> {
            self.ask();
            Ok(self.city.clone())
        }

        fn report(&self) -> Result<Report> {
            self.ask();
            self.report.ok_or_else(|| anyhow::anyhow!("no report scripted"))
        }

        fn units(&self) -> Result<UnitSystem> {
            self.ask();
            self.units.ok_or_else(|| anyhow::anyhow!("no units scripted"))
        }

        fn api_key(&self) -> Result<String> {
            self.ask();
            Ok(self.api_key.clone())
        }
    }

    #[test]
    fn interactive_plan_prompts_for_everything() {
        let prompter = ScriptedPrompter {
            city: "  Madrid \n".into(),
            report: Some(Report::Forecast),
            units: Some(UnitSystem::Imperial),
            ..Default::default()
        };

        let plan = plan(None, None, None, &prompter).unwrap();

        assert_eq!(
            plan,
            Plan { report: Report::Forecast, city: "Madrid".into(), units: UnitSystem::Imperial }
        );
        assert_eq!(prompter.asked.get(), 3);
    }

    #[test]
    fn empty_city_is_rejected_before_the_menu() {
        let prompter = ScriptedPrompter { city: "   ".into(), ..Default::default() };

        let err = plan(None, None, None, &prompter).unwrap_err();
        assert!(matches!(err.downcast_ref::<WeatherError>(), Some(WeatherError::EmptyLocation)));
        assert_eq!(prompter.asked.get(), 1);
    }

    #[test]
    fn command_plan_uses_flag_then_config_then_metric() {
        let prompter = ScriptedPrompter::default();
        let current = || Some(Command::Current { city: Some("Rome".into()) });

        let flagged =
            plan(current(), Some(UnitSystem::Imperial), Some(UnitSystem::Metric), &prompter).unwrap();
        assert_eq!(flagged.units, UnitSystem::Imperial);

        let configured = plan(current(), None, Some(UnitSystem::Imperial), &prompter).unwrap();
        assert_eq!(configured.units, UnitSystem::Imperial);

        let fallback = plan(current(), None, None, &prompter).unwrap();
        assert_eq!(fallback, Plan { report: Report::Current, city: "Rome".into(), units: UnitSystem::Metric });

        assert_eq!(prompter.asked.get(), 0);
    }

    #[test]
    fn missing_city_argument_is_prompted_for() {
        let prompter = ScriptedPrompter { city: "Lima".into(), ..Default::default() };

        let plan = plan(Some(Command::Forecast { city: None }), None, None, &prompter).unwrap();
        assert_eq!(plan.city, "Lima");
        assert_eq!(plan.report, Report::Forecast);
        assert_eq!(prompter.asked.get(), 1);
    }

    #[test]
    fn units_flag_accepts_only_known_systems() {
        let cli = Cli::try_parse_from(["weather", "--units", "imperial", "forecast", "Paris"]).unwrap();
        assert_eq!(cli.units, Some(UnitSystem::Imperial));
        assert!(matches!(cli.command, Some(Command::Forecast { city: Some(ref c) }) if c == "Paris"));

        let err = Cli::try_parse_from(["weather", "--units", "kelvin", "current"]).unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn no_command_means_interactive() {
        let cli = Cli::try_parse_from(["weather"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.units, None);
        assert_eq!(cli.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    fn config_cli(path: &Path, args: &[&str]) -> Cli {
        let path = path.to_str().unwrap();
        let argv = ["weather", "--config", path].into_iter().chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn configure_saves_key_and_units() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather-cli").join("config.toml");
        let prompter = ScriptedPrompter {
            api_key: "  SECRET \n".into(),
            units: Some(UnitSystem::Imperial),
            ..Default::default()
        };

        let mut out = Vec::new();
        config_cli(&path, &["configure"]).run(&prompter, &mut out).await.unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.api_key.as_deref(), Some("SECRET"));
        assert_eq!(saved.units, Some(UnitSystem::Imperial));

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Configuration saved to "));
        assert!(text.contains("config.toml"));
        assert_eq!(prompter.asked.get(), 2);
    }

    #[tokio::test]
    async fn configure_rejects_blank_key_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let prompter = ScriptedPrompter {
            api_key: "   ".into(),
            units: Some(UnitSystem::Metric),
            ..Default::default()
        };

        let mut out = Vec::new();
        let err = config_cli(&path, &["configure"]).run(&prompter, &mut out).await.unwrap_err();

        assert!(matches!(err.downcast_ref::<WeatherError>(), Some(WeatherError::MissingApiKey)));
        assert!(!path.exists());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn configure_replaces_an_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_key = = broken").unwrap();

        let prompter = ScriptedPrompter {
            api_key: "FRESH".into(),
            units: Some(UnitSystem::Metric),
            ..Default::default()
        };

        let mut out = Vec::new();
        config_cli(&path, &["configure"]).run(&prompter, &mut out).await.unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.api_key.as_deref(), Some("FRESH"));
        assert_eq!(saved.units, Some(UnitSystem::Metric));
    }

    #[tokio::test]
    async fn report_commands_still_fail_on_an_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_key = = broken").unwrap();

        let prompter = ScriptedPrompter::default();
        let mut out = Vec::new();
        let err = config_cli(&path, &["forecast", "Oslo"])
            .run(&prompter, &mut out)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to parse config file"));
        assert_eq!(prompter.asked.get(), 0);
    }

    #[tokio::test]
    async fn run_rejects_blank_city_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let prompter = ScriptedPrompter::default();
        let mut out = Vec::new();
        let err = config_cli(&path, &["current", "  "])
            .run(&prompter, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<WeatherError>(), Some(WeatherError::EmptyLocation)));
        assert!(out.is_empty());
    }
}

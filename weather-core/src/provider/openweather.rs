use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    error::WeatherError,
    model::{CurrentConditions, Forecast, ForecastSample, UnitSystem},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// GET `{base}/{endpoint}` and return the body of a successful response.
    async fn get(&self, endpoint: &str, location: &str, unit: UnitSystem) -> Result<String> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(%url, location, units = unit.as_str(), "Requesting OpenWeather data");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", unit.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({endpoint})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {endpoint} response body"))?;

        if !status.is_success() {
            return Err(WeatherError::RequestFailed {
                status: status.as_u16(),
                body: truncate_body(&body),
            }
            .into());
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, location: &str, unit: UnitSystem) -> Result<CurrentConditions> {
        let body = self.get("weather", location, unit).await?;
        let reading = parse_current(&body)?;

        info!(location = %reading.location, "Fetched current weather");
        Ok(reading)
    }

    async fn forecast(&self, location: &str, unit: UnitSystem) -> Result<Forecast> {
        let body = self.get("forecast", location, unit).await?;
        let forecast = parse_forecast(&body)?;

        info!(
            location = %forecast.location,
            samples = forecast.samples.len(),
            "Fetched forecast"
        );
        Ok(forecast)
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    wind: OwWind,
    visibility: Option<f64>,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

/// Decode a `/weather` response body.
pub fn parse_current(body: &str) -> Result<CurrentConditions> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather current JSON")?;

    Ok(CurrentConditions {
        location: parsed.name,
        temperature: parsed.main.temp,
        feels_like: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
        visibility_m: parsed.visibility,
        sunrise: unix_to_utc(parsed.sys.sunrise)?,
        sunset: unix_to_utc(parsed.sys.sunset)?,
    })
}

/// Decode a `/forecast` response body into samples.
pub fn parse_forecast(body: &str) -> Result<Forecast> {
    let parsed: OwForecastResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather forecast JSON")?;

    let location = if parsed.city.country.is_empty() {
        parsed.city.name
    } else {
        format!("{}, {}", parsed.city.name, parsed.city.country)
    };

    let samples = parsed
        .list
        .into_iter()
        .map(|entry| -> Result<ForecastSample> {
            let condition = entry
                .weather
                .into_iter()
                .next()
                .map(|w| w.description)
                .unwrap_or_else(|| "unknown".to_string());

            Ok(ForecastSample {
                timestamp: unix_to_utc(entry.dt)?,
                temp_min: entry.main.temp_min,
                temp_max: entry.main.temp_max,
                condition,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Forecast { location, samples })
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0).ok_or_else(|| anyhow!("Invalid UNIX timestamp {ts}"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

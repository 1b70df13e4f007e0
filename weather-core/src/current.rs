use chrono::{DateTime, TimeZone, Utc};

use crate::model::{CurrentConditions, UnitSystem};

const KM_TO_MILES: f64 = 0.621371;

/// Wall-clock format for sunrise/sunset.
pub const CLOCK_FORMAT: &str = "%H:%M";

/// Convert a visibility in metres to the display unit (km or miles).
pub fn visibility_in(visibility_m: f64, unit: UnitSystem) -> f64 {
    let km = visibility_m / 1000.0;
    match unit {
        UnitSystem::Metric => km,
        UnitSystem::Imperial => km * KM_TO_MILES,
    }
}

/// Labeled lines describing a current-weather reading.
pub fn format_current<Tz>(reading: &CurrentConditions, unit: UnitSystem, tz: &Tz) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let symbol = unit.temperature_symbol();

    let visibility = match reading.visibility_m {
        Some(m) => format!("{:.2} {}", visibility_in(m, unit), unit.visibility_unit()),
        None => "n/a".to_string(),
    };

    vec![
        format!("Temperature: {:.2}°{symbol}", reading.temperature),
        format!("Feels Like: {:.2}°{symbol}", reading.feels_like),
        format!("Humidity: {}%", reading.humidity_pct),
        format!("Wind Speed: {:.2} {}", reading.wind_speed, unit.wind_unit()),
        format!("Visibility: {visibility}"),
        format!("Sunrise: {}", wall_clock(reading.sunrise, tz)),
        format!("Sunset: {}", wall_clock(reading.sunset, tz)),
    ]
}

fn wall_clock<Tz>(instant: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    instant.with_timezone(tz).format(CLOCK_FORMAT).to_string()
}

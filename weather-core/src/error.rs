use thiserror::Error;

/// Failures the core reports with a typed cause.
///
/// Transport, decoding and config I/O errors are carried as `anyhow::Error`
/// with context instead; callers that need to branch on a cause can
/// `downcast_ref::<WeatherError>()`.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Unknown unit system '{0}'. Supported unit systems: metric, imperial.")]
    InvalidUnitSystem(String),

    #[error("City name cannot be empty.")]
    EmptyLocation,

    #[error(
        "API key is missing.\n\
         Hint: set the WEATHER_API_KEY environment variable or run `weather configure`."
    )]
    MissingApiKey,

    #[error("OpenWeather request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },
}

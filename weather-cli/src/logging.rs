use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing::Dispatch;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

pub const DEFAULT_LOG_FILE: &str = "weather.log";

const DEFAULT_FILTER: &str = "weather_core=info,weather_cli=info";

/// Build the diagnostic sink for one run.
///
/// - Appends timestamped events to `log_file`, filtered by `RUST_LOG`
///   (default `info` for our crates).
/// - Mirrors warnings and errors to stderr.
///
/// The returned dispatch is not installed globally; attach it to the work
/// that should report through it. If the log file cannot be opened the run
/// continues with stderr only.
pub fn dispatch(log_file: &Path) -> Dispatch {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file = OpenOptions::new().create(true).append(true).open(log_file);

    let (file_layer, open_error) = match file {
        Ok(file) => {
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(env_filter);
            (Some(layer), None)
        }
        Err(err) => (None, Some(err)),
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(LevelFilter::WARN);

    let dispatch = Dispatch::new(tracing_subscriber::registry().with(file_layer).with(console_layer));

    if let Some(err) = open_error {
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::warn!(path = %log_file.display(), error = %err, "Could not open log file");
        });
    }

    dispatch
}

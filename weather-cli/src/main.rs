//! Binary crate for the `weather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive prompts and configuration
//! - Human-friendly output formatting
//! - Wiring the diagnostic log

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, instrument::WithSubscriber};

mod cli;
mod logging;
mod prompt;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the variables may be set some other way.
    dotenvy::dotenv().ok();

    let cmd = cli::Cli::parse();
    let dispatch = logging::dispatch(&cmd.log_file);

    async move {
        info!(command = ?cmd.command, "Starting weather");

        let mut stdout = std::io::stdout();

        match cmd.run(&prompt::InquirePrompter::new(), &mut stdout).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!("{err:#}");
                ExitCode::FAILURE
            }
        }
    }
    .with_subscriber(dispatch)
    .await
}

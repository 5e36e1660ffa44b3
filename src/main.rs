//! mkto - Command-line access to the Marketo REST API
//!
//! Loads an instance profile, authenticates and prints API responses as JSON.

mod cli;

use std::process::ExitCode;

use clap::Parser;

use marketo_client::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();

    if let Err(e) = logging::init(args.verbose) {
        eprintln!("Warning: file logging disabled: {:#}", e);
    }

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Command failed: {}", err);
            eprintln!("Error: {}", err.user_message());
            if let Some(action) = err.suggested_action() {
                eprintln!("Hint: {}", action);
            }
            ExitCode::FAILURE
        }
    }
}

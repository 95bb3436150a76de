//! Command line entry point.

use std::io::Write;
use std::process::ExitCode;

use localize_assets::cli::{
    self,
    Command,
};
use tracing_subscriber::EnvFilter;

/// Parse arguments, run the command and map the outcome to an exit code.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = match cli::parse_args(pico_args::Arguments::from_env()) {
        Ok(command) => command,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(2);
        }
    };

    if command == Command::Help {
        let _ = std::io::stdout().lock().write_all(cli::USAGE.as_bytes());
        return ExitCode::SUCCESS;
    }

    match cli::run(command).await {
        Ok(diagnostics) => {
            tracing::info!(warnings = diagnostics.len(), "Build finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

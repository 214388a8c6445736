use std::process::ExitCode;

use clap::Parser;

use memsite::config::{load_with_cli, CliArgs};
use memsite::lifecycle::{startup, StartupError};
use memsite::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match load_with_cli(&args) {
        Ok(config) => config,
        Err(err) => {
            // Logging is configured by the file we failed to load.
            eprintln!("memsite: {}", StartupError::from(err));
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = logging::init(&config.logging) {
        eprintln!("memsite: init logging: {err}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.site.host,
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        header_read_secs = config.timeouts.header_read_secs,
        "memsite starting"
    );

    match startup::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

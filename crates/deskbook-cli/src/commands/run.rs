use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use deskbook_application::{BookingRunUseCase, RunOptions};
use deskbook_infrastructure::{ConfigService, EnvCredentials};
use tracing::warn;

pub fn execute(config_path: Option<PathBuf>, no_wait: bool) -> Result<ExitCode> {
    let service = match config_path {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new().context("Failed to resolve the configuration directory")?,
    };
    let config = service
        .load_run_config(&EnvCredentials)
        .with_context(|| format!("Invalid configuration ({})", service.path().display()))?;

    // Every call is awaited in sequence; one thread is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let use_case = BookingRunUseCase::new(config, RunOptions { no_wait });
    let reservation = runtime
        .block_on(use_case.execute())
        .context("Booking run failed")?;

    match reservation {
        Some(reservation) => {
            println!("Booked {}", reservation);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            warn!("No desk could be booked");
            Ok(ExitCode::FAILURE)
        }
    }
}

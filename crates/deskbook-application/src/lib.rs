//! Application layer for deskbook.
//!
//! Coordinates the login, the release wait and the scheduling driver into a
//! single booking run.

pub mod release;
pub mod scheduler;

pub use release::{release_delay, wait_for_release};
pub use scheduler::{BookingScheduler, build_windows, order_candidates};

use deskbook_core::booking::Reservation;
use deskbook_core::config::RunConfig;
use deskbook_core::error::Result;
use deskbook_interaction::{Authenticator, BookingClient, BookingSettings, FederationSession};
use tracing::{error, info};

/// Switches for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Book immediately instead of waiting for an imminent release
    pub no_wait: bool,
}

/// Use case for one complete booking run.
pub struct BookingRunUseCase {
    config: RunConfig,
    options: RunOptions,
}

impl BookingRunUseCase {
    pub fn new(config: RunConfig, options: RunOptions) -> Self {
        Self { config, options }
    }

    /// Logs in, waits for the release if it is imminent, then books.
    ///
    /// Returns `Ok(None)` when every window was tried without success.
    pub async fn execute(&self) -> Result<Option<Reservation>> {
        let config = &self.config;
        let institution = config.institution;
        info!(institution = %institution, "Starting booking run");

        let federation = FederationSession::new(
            config.endpoints.clone(),
            Authenticator::new(institution),
        )?;
        let cookies = match federation.login(&config.credentials).await {
            Ok(cookies) => cookies,
            Err(e) => {
                error!(error = %e, "Login failed");
                return Err(e);
            }
        };
        let client = BookingClient::new(&cookies, BookingSettings::from_config(config))?;

        if !self.options.no_wait {
            release::wait_for_release(
                release::local_now(config.timezone),
                config.release_time,
                config.max_release_wait,
            )
            .await;
        }

        // Windows are computed after the wait so that "today" is the release day.
        let today = release::local_now(config.timezone).date_naive();
        let windows = build_windows(
            today,
            institution.profile().days_ahead,
            &config.slots,
            config.timezone,
        )?;

        let reservation = BookingScheduler::new(&client, &config.preferences)
            .run(&windows)
            .await?;
        match &reservation {
            Some(reservation) => info!(reservation = %reservation, "Booked"),
            None => info!("Nothing booked"),
        }
        Ok(reservation)
    }
}

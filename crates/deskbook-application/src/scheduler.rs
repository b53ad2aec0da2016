//! Scheduling driver: walks the configured windows and resources until one
//! reservation sticks.
//!
//! # Policy
//!
//! Windows are tried in configuration order. Within a window the candidate
//! list comes from [`order_candidates`]; each candidate is reserved in turn:
//!
//! - `Success` ends the run
//! - `SlotUnavailable` moves on to the next resource
//! - `CheckoutRejected` abandons the window (the refusal is per window, usually
//!   a quota)
//! - a booking protocol error abandons that resource only
//!
//! Any other error aborts the run.

use chrono::NaiveDate;
use chrono_tz::Tz;
use deskbook_core::booking::{BookingApi, BookingOutcome, Reservation, ResourceId};
use deskbook_core::config::BookingPreferences;
use deskbook_core::error::Result;
use deskbook_core::window::{Slot, TimeWindow};
use tracing::{debug, info, warn};

/// Builds one window per slot, `days_ahead` days after `today`, keeping slot
/// order.
pub fn build_windows(
    today: NaiveDate,
    days_ahead: i64,
    slots: &[Slot],
    tz: Tz,
) -> Result<Vec<TimeWindow>> {
    slots
        .iter()
        .map(|slot| TimeWindow::for_slot(today, days_ahead, *slot, tz))
        .collect()
}

/// Orders the discovered resources into the list of booking candidates.
pub fn order_candidates(
    available: &[ResourceId],
    preferences: &BookingPreferences,
) -> Vec<ResourceId> {
    if preferences.preferred_resources.is_empty() {
        return available.to_vec();
    }

    let mut candidates: Vec<ResourceId> = preferences
        .preferred_resources
        .iter()
        .filter(|preferred| available.contains(preferred))
        .cloned()
        .collect();

    if preferences.accept_any_resource {
        candidates.extend(
            available
                .iter()
                .filter(|resource| !preferences.preferred_resources.contains(resource))
                .cloned(),
        );
    }

    candidates
}

/// Drives reservation attempts against a [`BookingApi`].
pub struct BookingScheduler<'a, A: BookingApi + ?Sized> {
    api: &'a A,
    preferences: &'a BookingPreferences,
}

impl<'a, A: BookingApi + ?Sized> BookingScheduler<'a, A> {
    pub fn new(api: &'a A, preferences: &'a BookingPreferences) -> Self {
        Self { api, preferences }
    }

    /// Returns the first confirmed reservation, or `None` when every window
    /// came up empty.
    pub async fn run(&self, windows: &[TimeWindow]) -> Result<Option<Reservation>> {
        for window in windows {
            if let Some(reservation) = self.try_window(window).await? {
                return Ok(Some(reservation));
            }
        }

        info!(windows = windows.len(), "No reservation made");
        Ok(None)
    }

    async fn try_window(&self, window: &TimeWindow) -> Result<Option<Reservation>> {
        let available = match self.api.find_available_resources(window).await {
            Ok(available) => available,
            Err(e) if e.is_attempt_scoped() => {
                warn!(window = %window, error = %e, "Skipping window, discovery failed");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let candidates = order_candidates(&available, self.preferences);
        if candidates.is_empty() {
            info!(window = %window, discovered = available.len(), "No suitable resources");
            return Ok(None);
        }
        debug!(window = %window, candidates = candidates.len(), "trying window");

        for resource in candidates {
            match self.api.reserve(&resource, window).await {
                Ok(BookingOutcome::Success) => {
                    return Ok(Some(Reservation {
                        resource,
                        window: *window,
                    }));
                }
                Ok(BookingOutcome::SlotUnavailable) => continue,
                Ok(BookingOutcome::CheckoutRejected) => {
                    info!(window = %window, "Checkout rejected, moving to next window");
                    return Ok(None);
                }
                Err(e) if e.is_attempt_scoped() => {
                    warn!(resource = %resource, error = %e, "Reservation attempt failed");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }
}

//! Waiting for the daily booking release.
//!
//! New slots open at a fixed local time (midnight by default). A run started
//! shortly before that moment logs in first and then sleeps until the release;
//! a run started any other time proceeds at once.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::info;

/// Next moment strictly after `now` at which the wall clock shows
/// `release_time`. Days on which that time does not exist are skipped.
pub fn next_release(now: DateTime<Tz>, release_time: NaiveTime) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let mut date = now.date_naive();

    for _ in 0..3 {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(release_time)).earliest() {
            if candidate > now {
                return Some(candidate);
            }
        }
        date = date.succ_opt()?;
    }
    None
}

/// How long to sleep before booking, if at all.
///
/// Returns a delay only when the next release is more than zero and at most
/// `max_wait` away.
pub fn release_delay(
    now: DateTime<Tz>,
    release_time: NaiveTime,
    max_wait: Duration,
) -> Option<Duration> {
    let release = next_release(now, release_time)?;
    let delay = (release - now).to_std().ok()?;

    (!delay.is_zero() && delay <= max_wait).then_some(delay)
}

/// Sleeps until the release when it is close enough; returns the time slept.
pub async fn wait_for_release(
    now: DateTime<Tz>,
    release_time: NaiveTime,
    max_wait: Duration,
) -> Duration {
    match release_delay(now, release_time, max_wait) {
        Some(delay) => {
            info!(
                seconds = delay.as_secs(),
                release = %release_time,
                "Waiting for booking release"
            );
            tokio::time::sleep(delay).await;
            delay
        }
        None => {
            info!(release = %release_time, "Release time is not imminent, booking now");
            Duration::ZERO
        }
    }
}

/// Current wall-clock time in `tz`.
pub fn local_now(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

//! Booking time windows.
//!
//! Windows are built from a wall-clock time of day, a days-ahead offset and an
//! IANA timezone. On the wire they always carry an explicit UTC offset
//! (`2025-01-18T14:00:00+01:00`), never `Z`.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{DeskbookError, Result};

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Parses an IANA timezone name such as `Europe/Berlin`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| DeskbookError::configuration(format!("Unknown timezone: {}", name)))
}

/// Returns the local timestamp `days_ahead` calendar days after `today` at
/// `time_of_day`.
///
/// For a time of day that falls into a DST gap there is no local timestamp and
/// a configuration error is returned; a repeated hour resolves to its earlier
/// occurrence.
pub fn future_timestamp(
    today: NaiveDate,
    days_ahead: i64,
    time_of_day: NaiveTime,
    tz: Tz,
) -> Result<DateTime<Tz>> {
    let days = u64::try_from(days_ahead).map_err(|_| {
        DeskbookError::configuration(format!("days ahead must not be negative: {}", days_ahead))
    })?;
    let date = today.checked_add_days(Days::new(days)).ok_or_else(|| {
        DeskbookError::configuration(format!("date out of range: {} + {} days", today, days))
    })?;

    tz.from_local_datetime(&date.and_time(time_of_day))
        .earliest()
        .ok_or_else(|| {
            DeskbookError::configuration(format!(
                "{} {} does not exist in {}",
                date, time_of_day, tz
            ))
        })
}

/// A wall-clock slot as configured, e.g. `13:00:00` to `18:00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parses a slot from `HH:MM:SS` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: NaiveTime::parse_from_str(start, "%H:%M:%S")?,
            end: NaiveTime::parse_from_str(end, "%H:%M:%S")?,
        })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// A concrete, timezone-aware booking interval. Invariant: `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        if start >= end {
            return Err(DeskbookError::configuration(format!(
                "time window must end after it starts: {} >= {}",
                start.format(WIRE_FORMAT),
                end.format(WIRE_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Builds the window for `slot` on the day `days_ahead` after `today`.
    pub fn for_slot(today: NaiveDate, days_ahead: i64, slot: Slot, tz: Tz) -> Result<Self> {
        let start = future_timestamp(today, days_ahead, slot.start, tz)?;
        let end = future_timestamp(today, days_ahead, slot.end, tz)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }

    /// Start in wire format.
    pub fn start_param(&self) -> String {
        self.start.format(WIRE_FORMAT).to_string()
    }

    /// End in wire format.
    pub fn end_param(&self) -> String {
        self.end.format(WIRE_FORMAT).to_string()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start_param(), self.end_param())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn berlin() -> Tz {
        parse_timezone("Europe/Berlin").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
    }

    #[test]
    fn test_winter_offset() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let ts = future_timestamp(today, 3, time("14:00:00"), berlin()).unwrap();

        assert_eq!(
            ts.format(WIRE_FORMAT).to_string(),
            "2025-01-18T14:00:00+01:00"
        );
    }

    #[test]
    fn test_summer_offset() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
        let ts = future_timestamp(today, 3, time("14:00:00"), berlin()).unwrap();

        assert_eq!(
            ts.format(WIRE_FORMAT).to_string(),
            "2025-07-18T14:00:00+02:00"
        );
    }

    #[test]
    fn test_days_ahead_crosses_dst_change() {
        // Berlin switches to summer time on 2025-03-30.
        let today = NaiveDate::from_ymd_opt(2025, 3, 28).unwrap();
        let ts = future_timestamp(today, 3, time("14:00:00"), berlin()).unwrap();

        assert_eq!(
            ts.format(WIRE_FORMAT).to_string(),
            "2025-03-31T14:00:00+02:00"
        );
    }

    #[test]
    fn test_nonexistent_local_time_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 27).unwrap();
        let err = future_timestamp(today, 3, time("02:30:00"), berlin()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_window_requires_start_before_end() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let slot = Slot::parse("18:00:00", "13:00:00").unwrap();

        let err = TimeWindow::for_slot(today, 3, slot, berlin()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_window_params() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let slot = Slot::parse("13:00:00", "18:00:00").unwrap();
        let window = TimeWindow::for_slot(today, 3, slot, berlin()).unwrap();

        assert_eq!(window.start_param(), "2025-01-18T13:00:00+01:00");
        assert_eq!(window.end_param(), "2025-01-18T18:00:00+01:00");
        assert_eq!(window.timezone(), berlin());
    }

    #[test]
    fn test_unknown_timezone() {
        assert!(parse_timezone("Mars/Olympus").unwrap_err().is_configuration());
    }

    #[test]
    fn test_malformed_slot() {
        assert!(Slot::parse("13h", "18:00:00").unwrap_err().is_configuration());
    }
}

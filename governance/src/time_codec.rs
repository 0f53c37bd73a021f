//! Calendar date <-> ledger epoch-seconds conversion
//!
//! Both directions are pinned to UTC, so a date entered by a user comes back
//! out of the ledger as the same date regardless of the machine's timezone.

use chrono::{DateTime, NaiveDate, Utc};

use crate::constants::SECONDS_PER_DAY;
use crate::error::{GovernanceError, Result};

/// Ledger time: whole seconds since the Unix epoch
pub type EpochSeconds = u64;

/// ISO-8601 calendar date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date and return the epoch seconds of its UTC midnight.
pub fn date_to_epoch_seconds(date: &str) -> Result<EpochSeconds> {
    let trimmed = date.trim();
    let parsed = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|e| GovernanceError::InvalidDate(format!("{:?}: {}", trimmed, e)))?;

    let midnight = parsed
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| GovernanceError::InvalidDate(format!("{}: no midnight", parsed)))?;

    EpochSeconds::try_from(midnight.and_utc().timestamp()).map_err(|_| {
        GovernanceError::InvalidDate(format!("{} precedes the Unix epoch", parsed))
    })
}

/// Format epoch seconds as a UTC `YYYY-MM-DD` date, dropping the time of day.
pub fn epoch_seconds_to_date_string(seconds: EpochSeconds) -> Result<String> {
    let signed = i64::try_from(seconds).map_err(|_| {
        GovernanceError::InvalidDate(format!("timestamp {} exceeds i64 range", seconds))
    })?;

    let instant = DateTime::<Utc>::from_timestamp(signed, 0).ok_or_else(|| {
        GovernanceError::InvalidDate(format!("timestamp {} is outside the calendar", seconds))
    })?;

    Ok(instant.format(DATE_FORMAT).to_string())
}

/// Current wall-clock time. Read this at evaluation time, never cache it.
pub fn now_epoch_seconds() -> EpochSeconds {
    EpochSeconds::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// UTC midnight of the day containing `seconds`
pub fn start_of_day(seconds: EpochSeconds) -> EpochSeconds {
    seconds - seconds % SECONDS_PER_DAY
}

/// UTC midnight of the day after the one containing `seconds`
pub fn start_of_next_day(seconds: EpochSeconds) -> EpochSeconds {
    start_of_day(seconds).saturating_add(SECONDS_PER_DAY)
}

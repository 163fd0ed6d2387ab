//! # Temporal Types
//!
//! [`Timestamp`] is a UTC instant truncated to seconds. It is the form that
//! commitments bind to: `YYYY-MM-DDTHH:MM:SSZ`, never `+00:00`, never
//! fractional seconds. Local offsets would produce different canonical bytes
//! for the same instant and break independent re-verification.
//!
//! [`CalendarDate`] is a plain `YYYY-MM-DD` date used for certificate issue
//! and expiry dates.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    ///
    /// `+00:00` is rejected even though it denotes the same instant, so
    /// that the textual form a caller supplies is always the form that
    /// gets committed.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp {
                value: s.to_string(),
                reason: "must use Z suffix (UTC only)".into(),
            });
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| CoreError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// From Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, CoreError> {
        let dt = DateTime::from_timestamp(secs, 0).ok_or_else(|| CoreError::InvalidTimestamp {
            value: secs.to_string(),
            reason: "out of range".into(),
        })?;
        Ok(Self(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// The UTC calendar date of this instant.
    pub fn date(&self) -> CalendarDate {
        CalendarDate(self.0.date_naive())
    }

    /// Render as ISO 8601 with Z suffix (e.g. `2025-01-01T09:30:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// A calendar date in strict `YYYY-MM-DD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Parse a strict `YYYY-MM-DD` date.
    ///
    /// `field` names the metadata field for error reporting.
    pub fn parse(field: &'static str, s: &str) -> Result<Self, CoreError> {
        let invalid = |reason: String| CoreError::InvalidDate {
            field,
            value: s.to_string(),
            reason,
        };
        // chrono accepts unpadded months/days; the committed form must be exact.
        if s.len() != 10 {
            return Err(invalid("expected YYYY-MM-DD".into()));
        }
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| invalid(e.to_string()))?;
        Ok(Self(date))
    }

    /// Build from year, month, day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Render as `YYYY-MM-DD`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// The first instant after this date ends (next day 00:00:00Z).
    ///
    /// A certificate expiring on this date is valid through the whole day.
    pub fn end_of_day(&self) -> Timestamp {
        let start = self.0.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        Timestamp::from_utc(start + Duration::days(1))
    }
}

impl std::fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

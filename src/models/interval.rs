use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

/// Half-open rental window `[start, end)`, UTC-normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppError> {
        if end <= start {
            return Err(AppError::validation("end_time must be after start_time"));
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, AppError> {
        Self::new(
            parse_instant("start_time", start)?,
            parse_instant("end_time", end)?,
        )
    }

    /// Half-open overlap. Mirrors the predicate in
    /// `queries::find_overlapping_booking`.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Closed-interval membership, used to decide whether a hire is live.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Parses an RFC 3339 timestamp. Naive local times are rejected: the offset
/// has to be spelled out by the client.
///
/// The result must round-trip through storage unchanged: at most microsecond
/// precision and a four-digit UTC year.
pub fn parse_instant(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    let at = DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            AppError::Validation(format!(
                "{field} must be an RFC 3339 timestamp with an explicit UTC offset, got {raw:?}"
            ))
        })?;

    if at.nanosecond() % 1_000 != 0 {
        return Err(AppError::Validation(format!(
            "{field} supports at most microsecond precision, got {raw:?}"
        )));
    }
    if !(0..=9999).contains(&at.year()) {
        return Err(AppError::Validation(format!(
            "{field} must fall between years 0000 and 9999 in UTC, got {raw:?}"
        )));
    }
    Ok(at)
}

/// `deserialize_with` adapter running optional timestamps through
/// [`parse_instant`].
pub fn deserialize_opt_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_instant("timestamp", &raw).map_err(serde::de::Error::custom))
        .transpose()
}

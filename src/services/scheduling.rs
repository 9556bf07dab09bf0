use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Interval;

pub const CONFLICT_MESSAGE: &str = "This car is already booked during the selected period.";

/// Gap, in minutes, a booking may leave behind it and still count as
/// "preceding" the next.
pub const DEFAULT_PRECEDING_BUFFER_MINUTES: i64 = 30;

/// Fails with `Conflict` when an occupying booking on `car_id` overlaps
/// `interval`. `exclude_id` skips the booking being rescheduled.
///
/// Must run inside the same unit of work as the write it guards.
pub fn ensure_car_free(
    conn: &Connection,
    car_id: i64,
    interval: &Interval,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    if let Some(existing) = queries::find_overlapping_booking(conn, car_id, interval, exclude_id)? {
        tracing::info!(
            car_id,
            conflicting_booking_id = existing.id,
            start = %interval.start,
            end = %interval.end,
            "booking rejected: overlap"
        );
        debug_assert!(existing.interval().overlaps(interval));
        return Err(AppError::Conflict(CONFLICT_MESSAGE.to_string()));
    }
    Ok(())
}

/// Upper bound on the look-back window, one week.
pub const MAX_PRECEDING_BUFFER_MINUTES: i64 = 7 * 24 * 60;

/// Validates a client-supplied look-back window in minutes.
pub fn preceding_buffer(minutes: i64) -> Result<Duration, AppError> {
    if !(0..=MAX_PRECEDING_BUFFER_MINUTES).contains(&minutes) {
        return Err(AppError::Validation(format!(
            "buffer_minutes must be between 0 and {MAX_PRECEDING_BUFFER_MINUTES}"
        )));
    }
    Duration::try_minutes(minutes)
        .ok_or_else(|| AppError::validation("buffer_minutes is out of range"))
}

/// True when an occupying booking on the car ends within `buffer` before
/// `start_time` (both bounds inclusive).
pub fn is_preceding_booking(
    conn: &Connection,
    car_id: i64,
    start_time: DateTime<Utc>,
    buffer: Duration,
) -> Result<bool, AppError> {
    let window_start = start_time
        .checked_sub_signed(buffer)
        .ok_or_else(|| AppError::validation("buffer_minutes reaches past the earliest supported time"))?;
    Ok(queries::find_booking_ending_between(conn, car_id, &window_start, &start_time)?.is_some())
}

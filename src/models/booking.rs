use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::interval::{parse_instant, Interval};
use crate::models::photo::PhotoSlots;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub member_id: i64,
    pub car_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub hire_started_at: Option<DateTime<Utc>>,
    pub keys_retrieved_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub photos: PhotoSlots,
}

impl Booking {
    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Time-driven transition applied on read: a hire whose window has
    /// closed is reported as expired. Returns true when the status changed.
    pub fn reclassify(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == BookingStatus::InProgress && self.end_time < now {
            self.status = BookingStatus::Expired;
            return true;
        }
        false
    }
}

/// A booking that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub member_id: i64,
    pub car_id: i64,
    pub interval: Interval,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    InProgress,
    Completed,
    Expired,
    Cancelled,
}

impl BookingStatus {
    /// Statuses that hold the car's calendar.
    pub const OCCUPYING: [BookingStatus; 3] = [
        BookingStatus::Active,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
    ];

    /// Status given to every newly created booking. It is occupying, so a
    /// fresh booking blocks the window immediately.
    pub const INITIAL: BookingStatus = BookingStatus::Confirmed;

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Active => "active",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Expired => "expired",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "active" => Some(BookingStatus::Active),
            "in_progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "expired" => Some(BookingStatus::Expired),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_occupying(&self) -> bool {
        Self::OCCUPYING.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Expired | BookingStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (Active, InProgress)
                | (Active, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Expired)
                | (InProgress, Cancelled)
                | (Expired, Completed)
        )
    }
}

/// Sparse update of a booking. Only the listed keys are accepted.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BookingPatch {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<BookingStatus>,
}

impl BookingPatch {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AppError> {
        let fields = value
            .as_object()
            .ok_or_else(|| AppError::validation("booking update must be a JSON object"))?;

        let mut patch = BookingPatch::default();
        for (key, value) in fields {
            match key.as_str() {
                "start_time" => {
                    patch.start_time = Some(parse_instant(key, expect_str(key, value)?)?);
                }
                "end_time" => {
                    patch.end_time = Some(parse_instant(key, expect_str(key, value)?)?);
                }
                "status" => {
                    let raw = expect_str(key, value)?;
                    let status = BookingStatus::parse(raw).ok_or_else(|| {
                        AppError::Validation(format!("unknown booking status: {raw}"))
                    })?;
                    patch.status = Some(status);
                }
                other => {
                    return Err(AppError::Validation(format!(
                        "field cannot be updated: {other}"
                    )))
                }
            }
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.start_time.is_none() && self.end_time.is_none() && self.status.is_none()
    }

    /// Window after applying this patch on top of `booking`.
    pub fn merged_interval(&self, booking: &Booking) -> Result<Interval, AppError> {
        Interval::new(
            self.start_time.unwrap_or(booking.start_time),
            self.end_time.unwrap_or(booking.end_time),
        )
    }
}

fn expect_str<'a>(key: &str, value: &'a serde_json::Value) -> Result<&'a str, AppError> {
    value
        .as_str()
        .ok_or_else(|| AppError::Validation(format!("{key} must be a string")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(s: &str) -> DateTime<Utc> {
        parse_instant("t", s).unwrap()
    }

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: 1,
            member_id: 10,
            car_id: 7,
            start_time: at("2025-01-01T10:00:00Z"),
            end_time: at("2025-01-01T12:00:00Z"),
            status,
            created_at: at("2024-12-30T09:00:00Z"),
            hire_started_at: None,
            keys_retrieved_at: None,
            photos: PhotoSlots::default(),
        }
    }

    #[test]
    fn test_status_round_trip_through_text() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Active,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Expired,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("booked"), None);
    }

    #[test]
    fn test_initial_status_is_occupying() {
        assert!(BookingStatus::INITIAL.is_occupying());
        assert!(!BookingStatus::Pending.is_occupying());
        assert!(!BookingStatus::Cancelled.is_occupying());
    }

    #[test]
    fn test_transitions() {
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::InProgress));
        assert!(BookingStatus::InProgress.can_transition_to(BookingStatus::Completed));
        assert!(BookingStatus::Expired.can_transition_to(BookingStatus::Completed));
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::InProgress));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Confirmed));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Cancelled));
    }

    #[test]
    fn test_reclassify_expires_overdue_hire() {
        let mut b = booking(BookingStatus::InProgress);
        assert!(!b.reclassify(at("2025-01-01T12:00:00Z")));
        assert_eq!(b.status, BookingStatus::InProgress);
        assert!(b.reclassify(at("2025-01-01T12:00:01Z")));
        assert_eq!(b.status, BookingStatus::Expired);
    }

    #[test]
    fn test_reclassify_ignores_other_statuses() {
        let mut b = booking(BookingStatus::Confirmed);
        assert!(!b.reclassify(at("2026-01-01T00:00:00Z")));
        assert_eq!(b.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_patch_parses_known_fields() {
        let patch = BookingPatch::from_json(&json!({
            "start_time": "2025-01-01T11:00:00Z",
            "status": "cancelled"
        }))
        .unwrap();
        assert_eq!(patch.start_time, Some(at("2025-01-01T11:00:00Z")));
        assert_eq!(patch.end_time, None);
        assert_eq!(patch.status, Some(BookingStatus::Cancelled));
    }

    #[test]
    fn test_patch_rejects_unknown_and_protected_keys() {
        for body in [
            json!({"member_id": 99}),
            json!({"car_id": 3}),
            json!({"colour": "red"}),
        ] {
            assert!(matches!(
                BookingPatch::from_json(&body),
                Err(AppError::Validation(_))
            ));
        }
        assert!(BookingPatch::from_json(&json!([1, 2])).is_err());
        assert!(BookingPatch::from_json(&json!({"status": "booked"})).is_err());
        assert!(BookingPatch::from_json(&json!({"end_time": 5})).is_err());
    }

    #[test]
    fn test_merged_interval_checks_order() {
        let b = booking(BookingStatus::Confirmed);
        let patch = BookingPatch {
            end_time: Some(at("2025-01-01T09:00:00Z")),
            ..Default::default()
        };
        assert!(patch.merged_interval(&b).is_err());

        let patch = BookingPatch {
            end_time: Some(at("2025-01-01T13:00:00Z")),
            ..Default::default()
        };
        let merged = patch.merged_interval(&b).unwrap();
        assert_eq!(merged.start, b.start_time);
        assert_eq!(merged.end, at("2025-01-01T13:00:00Z"));
    }
}

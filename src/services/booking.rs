use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::queries::{self, BookingFilter};
use crate::db::Db;
use crate::errors::AppError;
use crate::models::{
    Booking, BookingPatch, BookingStatus, Car, Interval, Member, NewBooking, PhotoSlot,
};
use crate::services::scheduling;

/// Creates a booking for `caller` on `car_id`. The overlap check and the
/// insert share one IMMEDIATE transaction, so concurrent creates on the same
/// car are serialized and at most one of them commits.
pub fn create(
    db: &Db,
    caller: &Member,
    car_id: i64,
    interval: Interval,
    now: DateTime<Utc>,
) -> Result<(Booking, Car), AppError> {
    let (booking, car) = db.unit_of_work(|conn| {
        let car = queries::get_car(conn, car_id)?
            .ok_or_else(|| AppError::not_found(format!("car {car_id}")))?;

        scheduling::ensure_car_free(conn, car_id, &interval, None)?;

        let booking = queries::insert_booking(
            conn,
            &NewBooking {
                member_id: caller.id,
                car_id,
                interval,
                status: BookingStatus::INITIAL,
                created_at: now,
            },
        )?;
        Ok((booking, car))
    })?;

    tracing::info!(
        booking_id = booking.id,
        car_id,
        member_id = caller.id,
        start = %booking.start_time,
        end = %booking.end_time,
        "booking created"
    );
    Ok((booking, car))
}

/// Loads a booking, enforces ownership and applies lazy expiry. Must run in
/// a unit of work: a reclassified status is written back.
fn load_owned(
    conn: &Connection,
    booking_id: i64,
    caller: &Member,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    let mut booking = queries::get_booking(conn, booking_id)?
        .ok_or_else(|| AppError::not_found(format!("booking {booking_id}")))?;

    if booking.member_id != caller.id {
        return Err(AppError::Forbidden("not your booking".to_string()));
    }

    if booking.reclassify(now) {
        queries::update_booking_status(conn, booking.id, booking.status)?;
        tracing::info!(booking_id = booking.id, "booking expired");
    }
    Ok(booking)
}

pub fn get(
    db: &Db,
    booking_id: i64,
    caller: &Member,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    db.unit_of_work(|conn| load_owned(conn, booking_id, caller, now))
}

/// The caller's bookings, newest start first.
pub fn list(
    db: &Db,
    caller: &Member,
    filter: &BookingFilter,
    now: DateTime<Utc>,
) -> Result<Vec<Booking>, AppError> {
    db.unit_of_work(|conn| {
        let mut bookings = queries::list_bookings_for_member(conn, caller.id, filter)?;
        for booking in bookings.iter_mut() {
            if booking.reclassify(now) {
                queries::update_booking_status(conn, booking.id, booking.status)?;
            }
        }
        Ok(bookings)
    })
}

pub fn update(
    db: &Db,
    booking_id: i64,
    caller: &Member,
    patch: BookingPatch,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    if patch.is_empty() {
        return Err(AppError::validation("no updatable fields supplied"));
    }

    let booking = db.unit_of_work(|conn| {
        let mut booking = load_owned(conn, booking_id, caller, now)?;

        let merged = patch.merged_interval(&booking)?;
        let window_changed = merged != booking.interval();
        if window_changed && booking.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "cannot reschedule a {} booking",
                booking.status.as_str()
            )));
        }

        let current = booking.status;
        let target = patch.status.unwrap_or(current);
        if target != current && !current.can_transition_to(target) {
            return Err(AppError::InvalidState(format!(
                "booking cannot move from {} to {}",
                current.as_str(),
                target.as_str()
            )));
        }

        let entering_occupied = target.is_occupying() && !current.is_occupying();
        if target.is_occupying() && (window_changed || entering_occupied) {
            scheduling::ensure_car_free(conn, booking.car_id, &merged, Some(booking.id))?;
        }

        booking.start_time = merged.start;
        booking.end_time = merged.end;
        booking.status = target;
        if target == BookingStatus::InProgress && booking.hire_started_at.is_none() {
            booking.hire_started_at = Some(now);
        }
        queries::update_booking(conn, &booking)?;
        Ok(booking)
    })?;

    tracing::info!(booking_id, status = booking.status.as_str(), "booking updated");
    Ok(booking)
}

/// Applies an explicit lifecycle move to an owned booking.
fn transition(
    db: &Db,
    booking_id: i64,
    caller: &Member,
    now: DateTime<Utc>,
    action: &'static str,
    apply: impl FnOnce(&mut Booking) -> Result<(), AppError>,
) -> Result<Booking, AppError> {
    let booking = db.unit_of_work(|conn| {
        let mut booking = load_owned(conn, booking_id, caller, now)?;
        apply(&mut booking)?;
        queries::update_booking(conn, &booking)?;
        Ok(booking)
    })?;

    tracing::info!(
        booking_id,
        action,
        status = booking.status.as_str(),
        "booking transitioned"
    );
    Ok(booking)
}

fn illegal(action: &str, status: BookingStatus) -> AppError {
    AppError::InvalidState(format!(
        "cannot {action} a booking that is {}",
        status.as_str()
    ))
}

pub fn start_hire(
    db: &Db,
    booking_id: i64,
    caller: &Member,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    transition(db, booking_id, caller, now, "start_hire", |booking| {
        match booking.status {
            BookingStatus::Confirmed | BookingStatus::Active => {
                booking.status = BookingStatus::InProgress;
                booking.hire_started_at = Some(now);
                Ok(())
            }
            other => Err(illegal("start", other)),
        }
    })
}

pub fn confirm_keys(
    db: &Db,
    booking_id: i64,
    caller: &Member,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    transition(db, booking_id, caller, now, "confirm_keys", |booking| {
        match booking.status {
            BookingStatus::Confirmed | BookingStatus::Active => {
                booking.status = BookingStatus::InProgress;
                booking.hire_started_at.get_or_insert(now);
            }
            BookingStatus::InProgress => {}
            other => return Err(illegal("collect keys for", other)),
        }
        booking.keys_retrieved_at = Some(now);
        Ok(())
    })
}

pub fn complete(
    db: &Db,
    booking_id: i64,
    caller: &Member,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    transition(db, booking_id, caller, now, "complete", |booking| {
        if !booking.status.can_transition_to(BookingStatus::Completed) {
            return Err(illegal("complete", booking.status));
        }
        booking.status = BookingStatus::Completed;
        Ok(())
    })
}

pub fn cancel(
    db: &Db,
    booking_id: i64,
    caller: &Member,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    transition(db, booking_id, caller, now, "cancel", |booking| {
        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(illegal("cancel", booking.status));
        }
        booking.status = BookingStatus::Cancelled;
        Ok(())
    })
}

/// Expires the caller's overdue hires, then returns the one hire whose
/// window contains `now`, if any.
pub fn get_active(
    db: &Db,
    caller: &Member,
    now: DateTime<Utc>,
) -> Result<Option<Booking>, AppError> {
    db.unit_of_work(|conn| {
        let hires =
            queries::list_bookings_for_member_with_status(conn, caller.id, BookingStatus::InProgress)?;

        let mut live = None;
        for mut booking in hires {
            if booking.reclassify(now) {
                queries::update_booking_status(conn, booking.id, booking.status)?;
                tracing::info!(booking_id = booking.id, "booking expired");
                continue;
            }
            if live.is_none() && booking.interval().covers(now) {
                live = Some(booking);
            }
        }
        Ok(live)
    })
}

pub fn set_photo(
    db: &Db,
    booking_id: i64,
    caller: &Member,
    slot: PhotoSlot,
    url: String,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    db.unit_of_work(|conn| {
        let mut booking = load_owned(conn, booking_id, caller, now)?;
        queries::set_booking_photo(conn, booking.id, slot, &url)?;
        booking.photos.set(slot, url);
        tracing::info!(booking_id, slot = slot.key(), "booking photo stored");
        Ok(booking)
    })
}

pub fn is_preceding_booking(
    db: &Db,
    car_id: i64,
    start_time: DateTime<Utc>,
    buffer: chrono::Duration,
) -> Result<bool, AppError> {
    db.read(|conn| scheduling::is_preceding_booking(conn, car_id, start_time, buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{parse_instant, MemberStatus};

    fn at(s: &str) -> DateTime<Utc> {
        parse_instant("t", s).unwrap()
    }

    fn iv(start: &str, end: &str) -> Interval {
        Interval::new(at(start), at(end)).unwrap()
    }

    struct Fixture {
        db: Db,
        car_id: i64,
        alice: Member,
        bob: Member,
    }

    fn setup() -> Fixture {
        let db = Db::new(db::init_db(":memory:").unwrap());
        let now = at("2024-12-01T00:00:00Z");
        let (car_id, alice, bob) = db
            .unit_of_work(|conn| {
                let airport = queries::insert_airport(
                    conn,
                    &serde_json::from_value(serde_json::json!({"name": "Sydney"})).unwrap(),
                    &now,
                )?;
                let car = queries::insert_car(
                    conn,
                    &serde_json::from_value(serde_json::json!({
                        "registration": "CAR007",
                        "airport_id": airport.id
                    }))
                    .unwrap(),
                    &now,
                )?;
                let alice = queries::insert_member(
                    conn,
                    "alice@example.com",
                    Some("Alice"),
                    None,
                    MemberStatus::Verified,
                    &now,
                )?;
                let bob = queries::insert_member(
                    conn,
                    "bob@example.com",
                    Some("Bob"),
                    None,
                    MemberStatus::Verified,
                    &now,
                )?;
                Ok((car.id, alice, bob))
            })
            .unwrap();
        Fixture {
            db,
            car_id,
            alice,
            bob,
        }
    }

    #[test]
    fn test_car_seven_scenario() {
        let f = setup();
        let now = at("2024-12-31T00:00:00Z");

        let (first, _) = create(&f.db, &f.alice, f.car_id, iv("2025-01-01T10:00:00Z", "2025-01-01T12:00:00Z"), now).unwrap();
        assert_eq!(first.status, BookingStatus::Confirmed);
        assert_eq!(first.member_id, f.alice.id);

        let clash = create(&f.db, &f.bob, f.car_id, iv("2025-01-01T11:00:00Z", "2025-01-01T13:00:00Z"), now);
        assert!(matches!(clash, Err(AppError::Conflict(_))));

        let (after, _) = create(&f.db, &f.bob, f.car_id, iv("2025-01-01T12:00:00Z", "2025-01-01T13:00:00Z"), now).unwrap();
        assert_eq!(after.member_id, f.bob.id);
    }

    #[test]
    fn test_create_unknown_car() {
        let f = setup();
        let result = create(&f.db, &f.alice, 999, iv("2025-01-01T10:00:00Z", "2025-01-01T12:00:00Z"), at("2024-12-31T00:00:00Z"));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_cancelled_booking_frees_window() {
        let f = setup();
        let now = at("2024-12-31T00:00:00Z");
        let window = iv("2025-01-01T10:00:00Z", "2025-01-01T12:00:00Z");
        let (b, _) = create(&f.db, &f.alice, f.car_id, window, now).unwrap();

        let cancelled = cancel(&f.db, b.id, &f.alice, now).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(create(&f.db, &f.bob, f.car_id, window, now).is_ok());

        // soft cancel: row still readable
        assert_eq!(get(&f.db, b.id, &f.alice, now).unwrap().status, BookingStatus::Cancelled);
        assert!(matches!(cancel(&f.db, b.id, &f.alice, now), Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_non_owner_is_forbidden() {
        let f = setup();
        let now = at("2024-12-31T00:00:00Z");
        let (b, _) = create(&f.db, &f.alice, f.car_id, iv("2025-01-01T10:00:00Z", "2025-01-01T12:00:00Z"), now).unwrap();

        assert!(matches!(cancel(&f.db, b.id, &f.bob, now), Err(AppError::Forbidden(_))));
        assert!(matches!(get(&f.db, b.id, &f.bob, now), Err(AppError::Forbidden(_))));
        assert!(matches!(
            set_photo(&f.db, b.id, &f.bob, PhotoSlot::BeforeFront, "https://x.test/a.jpg".into(), now),
            Err(AppError::Forbidden(_))
        ));
        let patch = BookingPatch {
            status: Some(BookingStatus::Cancelled),
            ..Default::default()
        };
        assert!(matches!(update(&f.db, b.id, &f.bob, patch, now), Err(AppError::Forbidden(_))));
        assert_eq!(get(&f.db, b.id, &f.alice, now).unwrap().status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_hire_lifecycle_and_lazy_expiry() {
        let f = setup();
        let (b, _) = create(&f.db, &f.alice, f.car_id, iv("2025-01-01T10:00:00Z", "2025-01-01T12:00:00Z"), at("2024-12-31T00:00:00Z")).unwrap();

        let started = start_hire(&f.db, b.id, &f.alice, at("2025-01-01T10:05:00Z")).unwrap();
        assert_eq!(started.status, BookingStatus::InProgress);
        assert_eq!(started.hire_started_at, Some(at("2025-01-01T10:05:00Z")));
        assert!(matches!(
            start_hire(&f.db, b.id, &f.alice, at("2025-01-01T10:06:00Z")),
            Err(AppError::InvalidState(_))
        ));

        let active = get_active(&f.db, &f.alice, at("2025-01-01T11:00:00Z")).unwrap();
        assert_eq!(active.map(|b| b.id), Some(b.id));

        assert!(get_active(&f.db, &f.alice, at("2025-01-01T12:00:01Z")).unwrap().is_none());
        let stored = f.db.read(|conn| Ok(queries::get_booking(conn, b.id)?)).unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Expired);

        let done = complete(&f.db, b.id, &f.alice, at("2025-01-01T12:30:00Z")).unwrap();
        assert_eq!(done.status, BookingStatus::Completed);
    }

    #[test]
    fn test_confirm_keys_forces_in_progress() {
        let f = setup();
        let (b, _) = create(&f.db, &f.alice, f.car_id, iv("2025-01-01T10:00:00Z", "2025-01-01T12:00:00Z"), at("2024-12-31T00:00:00Z")).unwrap();

        let keyed = confirm_keys(&f.db, b.id, &f.alice, at("2025-01-01T09:55:00Z")).unwrap();
        assert_eq!(keyed.status, BookingStatus::InProgress);
        assert_eq!(keyed.keys_retrieved_at, Some(at("2025-01-01T09:55:00Z")));
        assert_eq!(keyed.hire_started_at, Some(at("2025-01-01T09:55:00Z")));

        let again = confirm_keys(&f.db, b.id, &f.alice, at("2025-01-01T10:10:00Z")).unwrap();
        assert_eq!(again.status, BookingStatus::InProgress);
        assert_eq!(again.hire_started_at, Some(at("2025-01-01T09:55:00Z")));
        assert_eq!(again.keys_retrieved_at, Some(at("2025-01-01T10:10:00Z")));

        cancel(&f.db, b.id, &f.alice, at("2025-01-01T10:20:00Z")).unwrap();
        assert!(matches!(
            confirm_keys(&f.db, b.id, &f.alice, at("2025-01-01T10:30:00Z")),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn test_update_rechecks_overlap_excluding_self() {
        let f = setup();
        let now = at("2024-12-31T00:00:00Z");
        let (mine, _) = create(&f.db, &f.alice, f.car_id, iv("2025-01-01T10:00:00Z", "2025-01-01T12:00:00Z"), now).unwrap();
        create(&f.db, &f.bob, f.car_id, iv("2025-01-01T14:00:00Z", "2025-01-01T16:00:00Z"), now).unwrap();

        let extend = BookingPatch {
            end_time: Some(at("2025-01-01T13:00:00Z")),
            ..Default::default()
        };
        let updated = update(&f.db, mine.id, &f.alice, extend, now).unwrap();
        assert_eq!(updated.end_time, at("2025-01-01T13:00:00Z"));

        let into_bob = BookingPatch {
            end_time: Some(at("2025-01-01T15:00:00Z")),
            ..Default::default()
        };
        assert!(matches!(update(&f.db, mine.id, &f.alice, into_bob, now), Err(AppError::Conflict(_))));

        let reversed = BookingPatch {
            start_time: Some(at("2025-01-01T13:30:00Z")),
            ..Default::default()
        };
        assert!(matches!(update(&f.db, mine.id, &f.alice, reversed, now), Err(AppError::Validation(_))));

        let illegal = BookingPatch {
            status: Some(BookingStatus::Completed),
            ..Default::default()
        };
        assert!(matches!(update(&f.db, mine.id, &f.alice, illegal, now), Err(AppError::InvalidState(_))));

        assert!(matches!(
            update(&f.db, mine.id, &f.alice, BookingPatch::default(), now),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_set_photo_touches_only_its_slot() {
        let f = setup();
        let now = at("2024-12-31T00:00:00Z");
        let (b, _) = create(&f.db, &f.alice, f.car_id, iv("2025-01-01T10:00:00Z", "2025-01-01T12:00:00Z"), now).unwrap();

        set_photo(&f.db, b.id, &f.alice, PhotoSlot::BeforeFront, "https://cdn.test/front.jpg".into(), now).unwrap();
        let b = set_photo(&f.db, b.id, &f.alice, PhotoSlot::AfterDash, "https://cdn.test/dash.jpg".into(), now).unwrap();
        assert_eq!(b.photos.get(PhotoSlot::BeforeFront), Some("https://cdn.test/front.jpg"));
        assert_eq!(b.photos.get(PhotoSlot::AfterDash), Some("https://cdn.test/dash.jpg"));

        let stored = get(&f.db, b.id, &f.alice, now).unwrap();
        assert_eq!(stored.photos, b.photos);
        assert_eq!(stored.photos.get(PhotoSlot::BeforeLeft), None);
    }
}

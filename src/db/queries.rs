use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    Airport, Booking, BookingStatus, Car, CarStatus, Interval, Member, MemberStatus, NewAirport,
    NewBooking, NewCar, NewRate, NewSubscription, PhotoSlot, PhotoSlots, Rate, SearchLogEntry,
    Subscription,
};

// ── Encoding ──

/// Fixed-width UTC text, so string comparison in SQL is chronological.
const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn fmt_opt_ts(ts: Option<&DateTime<Utc>>) -> Option<String> {
    ts.map(fmt_ts)
}

fn fmt_opt_date(date: Option<&NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn ts_col(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("bad timestamp {raw:?}: {e}")))
}

fn opt_ts_col(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, format!("bad timestamp {raw:?}: {e}")))
    })
    .transpose()
}

fn opt_date_col(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map_err(|e| conversion_error(idx, format!("bad date {raw:?}: {e}")))
    })
    .transpose()
}

/// `'active', 'confirmed', 'in_progress'` for use in an `IN (...)` clause.
fn occupying_status_list() -> String {
    BookingStatus::OCCUPYING
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> rusqlite::Result<Vec<T>> {
    rows.collect()
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, member_id, car_id, start_time, end_time, status, created_at, \
     hire_started_at, keys_retrieved_at, \
     photo_before_front_url, photo_before_left_url, photo_before_right_url, photo_before_rear_url, \
     photo_after_front_url, photo_after_left_url, photo_after_right_url, photo_after_rear_url, \
     photo_after_dash_url";

fn booking_from_row(row: &Row) -> rusqlite::Result<Booking> {
    let status_str: String = row.get(5)?;
    let status = BookingStatus::parse(&status_str)
        .ok_or_else(|| conversion_error(5, format!("unknown booking status {status_str:?}")))?;

    Ok(Booking {
        id: row.get(0)?,
        member_id: row.get(1)?,
        car_id: row.get(2)?,
        start_time: ts_col(row, 3)?,
        end_time: ts_col(row, 4)?,
        status,
        created_at: ts_col(row, 6)?,
        hire_started_at: opt_ts_col(row, 7)?,
        keys_retrieved_at: opt_ts_col(row, 8)?,
        photos: PhotoSlots {
            photo_before_front_url: row.get(9)?,
            photo_before_left_url: row.get(10)?,
            photo_before_right_url: row.get(11)?,
            photo_before_rear_url: row.get(12)?,
            photo_after_front_url: row.get(13)?,
            photo_after_left_url: row.get(14)?,
            photo_after_right_url: row.get(15)?,
            photo_after_rear_url: row.get(16)?,
            photo_after_dash_url: row.get(17)?,
        },
    })
}

pub fn insert_booking(conn: &Connection, booking: &NewBooking) -> rusqlite::Result<Booking> {
    conn.execute(
        "INSERT INTO bookings (member_id, car_id, start_time, end_time, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            booking.member_id,
            booking.car_id,
            fmt_ts(&booking.interval.start),
            fmt_ts(&booking.interval.end),
            booking.status.as_str(),
            fmt_ts(&booking.created_at),
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_booking(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get_booking(conn: &Connection, id: i64) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        booking_from_row,
    )
    .optional()
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub car_id: Option<i64>,
    pub from_time: Option<DateTime<Utc>>,
    pub to_time: Option<DateTime<Utc>>,
}

pub fn list_bookings_for_member(
    conn: &Connection,
    member_id: i64,
    filter: &BookingFilter,
) -> rusqlite::Result<Vec<Booking>> {
    let mut sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE member_id = ?1");
    let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(member_id)];

    if let Some(car_id) = filter.car_id {
        args.push(Box::new(car_id));
        sql.push_str(&format!(" AND car_id = ?{}", args.len()));
    }
    if let Some(from) = &filter.from_time {
        args.push(Box::new(fmt_ts(from)));
        sql.push_str(&format!(" AND start_time >= ?{}", args.len()));
    }
    if let Some(to) = &filter.to_time {
        args.push(Box::new(fmt_ts(to)));
        sql.push_str(&format!(" AND end_time <= ?{}", args.len()));
    }
    sql.push_str(" ORDER BY start_time DESC");

    let mut stmt = conn.prepare(&sql)?;
    let arg_refs: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref()).collect();
    let rows = stmt.query_map(arg_refs.as_slice(), booking_from_row)?;
    collect(rows)
}

pub fn list_bookings_for_member_with_status(
    conn: &Connection,
    member_id: i64,
    status: BookingStatus,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE member_id = ?1 AND status = ?2 ORDER BY start_time ASC"
    ))?;
    let rows = stmt.query_map(params![member_id, status.as_str()], booking_from_row)?;
    collect(rows)
}

/// First occupying booking on `car_id` that overlaps `interval`, skipping
/// `exclude_id` (the booking being edited).
pub fn find_overlapping_booking(
    conn: &Connection,
    car_id: i64,
    interval: &Interval,
    exclude_id: Option<i64>,
) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE car_id = ?1
               AND status IN ({})
               AND start_time < ?2
               AND end_time > ?3
               AND (?4 IS NULL OR id != ?4)
             ORDER BY start_time ASC
             LIMIT 1",
            occupying_status_list()
        ),
        params![
            car_id,
            fmt_ts(&interval.end),
            fmt_ts(&interval.start),
            exclude_id
        ],
        booking_from_row,
    )
    .optional()
}

/// Cars at `airport_id` holding an occupying booking that overlaps `interval`.
pub fn cars_booked_during(
    conn: &Connection,
    airport_id: i64,
    interval: &Interval,
) -> rusqlite::Result<HashSet<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT b.car_id FROM bookings b
         JOIN cars c ON c.id = b.car_id
         WHERE c.airport_id = ?1
           AND b.status IN ({})
           AND b.start_time < ?2
           AND b.end_time > ?3",
        occupying_status_list()
    ))?;
    let rows = stmt.query_map(
        params![airport_id, fmt_ts(&interval.end), fmt_ts(&interval.start)],
        |row| row.get::<_, i64>(0),
    )?;
    rows.collect()
}

/// Occupying booking on `car_id` whose end falls in `[window_start, window_end]`.
pub fn find_booking_ending_between(
    conn: &Connection,
    car_id: i64,
    window_start: &DateTime<Utc>,
    window_end: &DateTime<Utc>,
) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE car_id = ?1
               AND status IN ({})
               AND end_time >= ?2
               AND end_time <= ?3
             ORDER BY end_time DESC
             LIMIT 1",
            occupying_status_list()
        ),
        params![car_id, fmt_ts(window_start), fmt_ts(window_end)],
        booking_from_row,
    )
    .optional()
}

/// Persists the lifecycle fields of `booking`. Photo slots are written
/// separately through [`set_booking_photo`].
pub fn update_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET start_time = ?1, end_time = ?2, status = ?3,
                hire_started_at = ?4, keys_retrieved_at = ?5
         WHERE id = ?6",
        params![
            fmt_ts(&booking.start_time),
            fmt_ts(&booking.end_time),
            booking.status.as_str(),
            fmt_opt_ts(booking.hire_started_at.as_ref()),
            fmt_opt_ts(booking.keys_retrieved_at.as_ref()),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    id: i64,
    status: BookingStatus,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn set_booking_photo(
    conn: &Connection,
    id: i64,
    slot: PhotoSlot,
    url: &str,
) -> rusqlite::Result<bool> {
    // Column name comes from a closed enum, never from the request.
    let count = conn.execute(
        &format!("UPDATE bookings SET {} = ?1 WHERE id = ?2", slot.column()),
        params![url, id],
    )?;
    Ok(count > 0)
}

pub fn count_bookings_for_car(conn: &Connection, car_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE car_id = ?1",
        params![car_id],
        |row| row.get(0),
    )
}

// ── Cars ──

const CAR_COLUMNS: &str = "id, registration, make_model, airport_id, status, price_hourly, \
     lockbox_ble_name, lockbox_serial, keyfob_code, image_url, carleft_url, carright_url, \
     carback_url, carfront_url, cardash_url, created_at";

fn car_from_row(row: &Row) -> rusqlite::Result<Car> {
    let status_str: String = row.get(4)?;
    let status = CarStatus::parse(&status_str)
        .ok_or_else(|| conversion_error(4, format!("unknown car status {status_str:?}")))?;

    Ok(Car {
        id: row.get(0)?,
        registration: row.get(1)?,
        make_model: row.get(2)?,
        airport_id: row.get(3)?,
        status,
        price_hourly: row.get(5)?,
        lockbox_ble_name: row.get(6)?,
        lockbox_serial: row.get(7)?,
        keyfob_code: row.get(8)?,
        image_url: row.get(9)?,
        carleft_url: row.get(10)?,
        carright_url: row.get(11)?,
        carback_url: row.get(12)?,
        carfront_url: row.get(13)?,
        cardash_url: row.get(14)?,
        created_at: ts_col(row, 15)?,
    })
}

pub fn insert_car(conn: &Connection, car: &NewCar, now: &DateTime<Utc>) -> rusqlite::Result<Car> {
    conn.execute(
        "INSERT INTO cars (registration, make_model, airport_id, status, price_hourly,
                           lockbox_ble_name, lockbox_serial, keyfob_code, image_url, carleft_url,
                           carright_url, carback_url, carfront_url, cardash_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            car.registration,
            car.make_model,
            car.airport_id,
            car.status.as_str(),
            car.price_hourly,
            car.lockbox_ble_name,
            car.lockbox_serial,
            car.keyfob_code,
            car.image_url,
            car.carleft_url,
            car.carright_url,
            car.carback_url,
            car.carfront_url,
            car.cardash_url,
            fmt_ts(now),
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_car(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get_car(conn: &Connection, id: i64) -> rusqlite::Result<Option<Car>> {
    conn.query_row(
        &format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = ?1"),
        params![id],
        car_from_row,
    )
    .optional()
}

pub fn list_cars(
    conn: &Connection,
    airport_id: Option<i64>,
    status: Option<CarStatus>,
) -> rusqlite::Result<Vec<Car>> {
    let mut sql = format!("SELECT {CAR_COLUMNS} FROM cars WHERE 1 = 1");
    let mut args: Vec<Box<dyn ToSql>> = vec![];

    if let Some(airport_id) = airport_id {
        args.push(Box::new(airport_id));
        sql.push_str(&format!(" AND airport_id = ?{}", args.len()));
    }
    if let Some(status) = status {
        args.push(Box::new(status.as_str()));
        sql.push_str(&format!(" AND status = ?{}", args.len()));
    }
    sql.push_str(" ORDER BY registration ASC, id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let arg_refs: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref()).collect();
    let rows = stmt.query_map(arg_refs.as_slice(), car_from_row)?;
    collect(rows)
}

/// Cars at the airport in a hireable status, ordered by registration.
pub fn bookable_cars_at(conn: &Connection, airport_id: i64) -> rusqlite::Result<Vec<Car>> {
    let statuses = CarStatus::BOOKABLE
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {CAR_COLUMNS} FROM cars
         WHERE airport_id = ?1 AND status IN ({statuses})
         ORDER BY registration ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![airport_id], car_from_row)?;
    collect(rows)
}

pub fn save_car(conn: &Connection, car: &Car) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE cars SET registration = ?1, make_model = ?2, airport_id = ?3, status = ?4,
                price_hourly = ?5, lockbox_ble_name = ?6, lockbox_serial = ?7, keyfob_code = ?8,
                image_url = ?9, carleft_url = ?10, carright_url = ?11, carback_url = ?12,
                carfront_url = ?13, cardash_url = ?14
         WHERE id = ?15",
        params![
            car.registration,
            car.make_model,
            car.airport_id,
            car.status.as_str(),
            car.price_hourly,
            car.lockbox_ble_name,
            car.lockbox_serial,
            car.keyfob_code,
            car.image_url,
            car.carleft_url,
            car.carright_url,
            car.carback_url,
            car.carfront_url,
            car.cardash_url,
            car.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_car(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM cars WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Airports ──

const AIRPORT_COLUMNS: &str =
    "id, name, icao_code, latitude, longitude, parking_description, is_active, created_at";

fn airport_from_row(row: &Row) -> rusqlite::Result<Airport> {
    Ok(Airport {
        id: row.get(0)?,
        name: row.get(1)?,
        icao_code: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        parking_description: row.get(5)?,
        is_active: row.get::<_, i32>(6)? != 0,
        created_at: ts_col(row, 7)?,
    })
}

pub fn insert_airport(
    conn: &Connection,
    airport: &NewAirport,
    now: &DateTime<Utc>,
) -> rusqlite::Result<Airport> {
    conn.execute(
        "INSERT INTO airports (name, icao_code, latitude, longitude, parking_description, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            airport.name,
            airport.icao_code,
            airport.latitude,
            airport.longitude,
            airport.parking_description,
            airport.is_active as i32,
            fmt_ts(now),
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_airport(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get_airport(conn: &Connection, id: i64) -> rusqlite::Result<Option<Airport>> {
    conn.query_row(
        &format!("SELECT {AIRPORT_COLUMNS} FROM airports WHERE id = ?1"),
        params![id],
        airport_from_row,
    )
    .optional()
}

pub fn get_active_airport(conn: &Connection, id: i64) -> rusqlite::Result<Option<Airport>> {
    conn.query_row(
        &format!("SELECT {AIRPORT_COLUMNS} FROM airports WHERE id = ?1 AND is_active = 1"),
        params![id],
        airport_from_row,
    )
    .optional()
}

pub fn list_airports(conn: &Connection, active_only: bool) -> rusqlite::Result<Vec<Airport>> {
    let sql = if active_only {
        format!("SELECT {AIRPORT_COLUMNS} FROM airports WHERE is_active = 1 ORDER BY name ASC")
    } else {
        format!("SELECT {AIRPORT_COLUMNS} FROM airports ORDER BY name ASC")
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], airport_from_row)?;
    collect(rows)
}

pub fn save_airport(conn: &Connection, airport: &Airport) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE airports SET name = ?1, icao_code = ?2, latitude = ?3, longitude = ?4,
                parking_description = ?5, is_active = ?6
         WHERE id = ?7",
        params![
            airport.name,
            airport.icao_code,
            airport.latitude,
            airport.longitude,
            airport.parking_description,
            airport.is_active as i32,
            airport.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_airport(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM airports WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Members ──

const MEMBER_COLUMNS: &str = "id, name, email, dob, address, renewal_date, platform, status, \
     licence_front_url, licence_back_url, selfie_url, licence_number, licence_expiry, created_at";

fn member_from_row(row: &Row) -> rusqlite::Result<Member> {
    let status_str: String = row.get(7)?;
    let status = MemberStatus::parse(&status_str)
        .ok_or_else(|| conversion_error(7, format!("unknown member status {status_str:?}")))?;

    Ok(Member {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        dob: opt_date_col(row, 3)?,
        address: row.get(4)?,
        renewal_date: opt_ts_col(row, 5)?,
        platform: row.get(6)?,
        status,
        licence_front_url: row.get(8)?,
        licence_back_url: row.get(9)?,
        selfie_url: row.get(10)?,
        licence_number: row.get(11)?,
        licence_expiry: opt_date_col(row, 12)?,
        created_at: ts_col(row, 13)?,
    })
}

pub fn insert_member(
    conn: &Connection,
    email: &str,
    name: Option<&str>,
    platform: Option<&str>,
    status: MemberStatus,
    now: &DateTime<Utc>,
) -> rusqlite::Result<Member> {
    conn.execute(
        "INSERT INTO members (email, name, platform, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![email.to_lowercase(), name, platform, status.as_str(), fmt_ts(now)],
    )?;
    let id = conn.last_insert_rowid();
    get_member(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get_member(conn: &Connection, id: i64) -> rusqlite::Result<Option<Member>> {
    conn.query_row(
        &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"),
        params![id],
        member_from_row,
    )
    .optional()
}

pub fn get_member_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<Member>> {
    conn.query_row(
        &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE email = ?1"),
        params![email],
        member_from_row,
    )
    .optional()
}

pub fn list_members(conn: &Connection) -> rusqlite::Result<Vec<Member>> {
    let mut stmt = conn.prepare(&format!("SELECT {MEMBER_COLUMNS} FROM members ORDER BY id ASC"))?;
    let rows = stmt.query_map([], member_from_row)?;
    collect(rows)
}

pub fn save_member(conn: &Connection, member: &Member) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE members SET name = ?1, dob = ?2, address = ?3, renewal_date = ?4, platform = ?5,
                status = ?6, licence_front_url = ?7, licence_back_url = ?8, selfie_url = ?9,
                licence_number = ?10, licence_expiry = ?11
         WHERE id = ?12",
        params![
            member.name,
            fmt_opt_date(member.dob.as_ref()),
            member.address,
            fmt_opt_ts(member.renewal_date.as_ref()),
            member.platform,
            member.status.as_str(),
            member.licence_front_url,
            member.licence_back_url,
            member.selfie_url,
            member.licence_number,
            fmt_opt_date(member.licence_expiry.as_ref()),
            member.id,
        ],
    )?;
    Ok(count > 0)
}

// ── Rates ──

const RATE_COLUMNS: &str = "id, airport_id, rate_name, hourly_rate, discount_threshold_hours, \
     discount_percent, gst_percent, is_gst_inclusive, active_from, active_to, is_active, \
     created_at, updated_at";

fn rate_from_row(row: &Row) -> rusqlite::Result<Rate> {
    Ok(Rate {
        id: row.get(0)?,
        airport_id: row.get(1)?,
        rate_name: row.get(2)?,
        hourly_rate: row.get(3)?,
        discount_threshold_hours: row.get(4)?,
        discount_percent: row.get(5)?,
        gst_percent: row.get(6)?,
        is_gst_inclusive: row.get::<_, Option<i32>>(7)?.map(|v| v != 0),
        active_from: opt_date_col(row, 8)?,
        active_to: opt_date_col(row, 9)?,
        is_active: row.get::<_, i32>(10)? != 0,
        created_at: ts_col(row, 11)?,
        updated_at: opt_ts_col(row, 12)?,
    })
}

pub fn insert_rate(conn: &Connection, rate: &NewRate, now: &DateTime<Utc>) -> rusqlite::Result<Rate> {
    conn.execute(
        "INSERT INTO rates (airport_id, rate_name, hourly_rate, discount_threshold_hours,
                            discount_percent, gst_percent, is_gst_inclusive, active_from,
                            active_to, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            rate.airport_id,
            rate.rate_name,
            rate.hourly_rate,
            rate.discount_threshold_hours,
            rate.discount_percent,
            rate.gst_percent,
            rate.is_gst_inclusive.map(|v| v as i32),
            fmt_opt_date(rate.active_from.as_ref()),
            fmt_opt_date(rate.active_to.as_ref()),
            rate.is_active as i32,
            fmt_ts(now),
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_rate(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get_rate(conn: &Connection, id: i64) -> rusqlite::Result<Option<Rate>> {
    conn.query_row(
        &format!("SELECT {RATE_COLUMNS} FROM rates WHERE id = ?1"),
        params![id],
        rate_from_row,
    )
    .optional()
}

pub fn list_rates(
    conn: &Connection,
    active_only: bool,
    airport_id: Option<i64>,
) -> rusqlite::Result<Vec<Rate>> {
    let mut sql = format!("SELECT {RATE_COLUMNS} FROM rates WHERE 1 = 1");
    let mut args: Vec<Box<dyn ToSql>> = vec![];

    if active_only {
        sql.push_str(" AND is_active = 1");
    }
    if let Some(airport_id) = airport_id {
        args.push(Box::new(airport_id));
        sql.push_str(&format!(" AND airport_id = ?{}", args.len()));
    }
    sql.push_str(" ORDER BY rate_name ASC");

    let mut stmt = conn.prepare(&sql)?;
    let arg_refs: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref()).collect();
    let rows = stmt.query_map(arg_refs.as_slice(), rate_from_row)?;
    collect(rows)
}

pub fn save_rate(conn: &Connection, rate: &Rate, now: &DateTime<Utc>) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE rates SET airport_id = ?1, rate_name = ?2, hourly_rate = ?3,
                discount_threshold_hours = ?4, discount_percent = ?5, gst_percent = ?6,
                is_gst_inclusive = ?7, active_from = ?8, active_to = ?9, is_active = ?10,
                updated_at = ?11
         WHERE id = ?12",
        params![
            rate.airport_id,
            rate.rate_name,
            rate.hourly_rate,
            rate.discount_threshold_hours,
            rate.discount_percent,
            rate.gst_percent,
            rate.is_gst_inclusive.map(|v| v as i32),
            fmt_opt_date(rate.active_from.as_ref()),
            fmt_opt_date(rate.active_to.as_ref()),
            rate.is_active as i32,
            fmt_ts(now),
            rate.id,
        ],
    )?;
    Ok(count > 0)
}

// ── Subscriptions ──

const SUBSCRIPTION_COLUMNS: &str =
    "id, member_id, platform, purchase_token, status, renewal_date, last_checked, created_at";

fn subscription_from_row(row: &Row) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        member_id: row.get(1)?,
        platform: row.get(2)?,
        purchase_token: row.get(3)?,
        status: row.get(4)?,
        renewal_date: opt_ts_col(row, 5)?,
        last_checked: opt_ts_col(row, 6)?,
        created_at: ts_col(row, 7)?,
    })
}

pub fn insert_subscription(
    conn: &Connection,
    sub: &NewSubscription,
    now: &DateTime<Utc>,
) -> rusqlite::Result<Subscription> {
    conn.execute(
        "INSERT INTO subscriptions (member_id, platform, purchase_token, status, renewal_date, last_checked, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            sub.member_id,
            sub.platform,
            sub.purchase_token,
            sub.status,
            fmt_opt_ts(sub.renewal_date.as_ref()),
            fmt_opt_ts(sub.last_checked.as_ref()),
            fmt_ts(now),
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_subscription(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get_subscription(conn: &Connection, id: i64) -> rusqlite::Result<Option<Subscription>> {
    conn.query_row(
        &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?1"),
        params![id],
        subscription_from_row,
    )
    .optional()
}

pub fn list_subscriptions(
    conn: &Connection,
    member_id: Option<i64>,
    status: Option<&str>,
) -> rusqlite::Result<Vec<Subscription>> {
    let mut sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE 1 = 1");
    let mut args: Vec<Box<dyn ToSql>> = vec![];

    if let Some(member_id) = member_id {
        args.push(Box::new(member_id));
        sql.push_str(&format!(" AND member_id = ?{}", args.len()));
    }
    if let Some(status) = status {
        args.push(Box::new(status.to_string()));
        sql.push_str(&format!(" AND status = ?{}", args.len()));
    }
    sql.push_str(" ORDER BY id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let arg_refs: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref()).collect();
    let rows = stmt.query_map(arg_refs.as_slice(), subscription_from_row)?;
    collect(rows)
}

pub fn save_subscription(conn: &Connection, sub: &Subscription) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE subscriptions SET platform = ?1, purchase_token = ?2, status = ?3,
                renewal_date = ?4, last_checked = ?5
         WHERE id = ?6",
        params![
            sub.platform,
            sub.purchase_token,
            sub.status,
            fmt_opt_ts(sub.renewal_date.as_ref()),
            fmt_opt_ts(sub.last_checked.as_ref()),
            sub.id,
        ],
    )?;
    Ok(count > 0)
}

// ── Search Logs ──

pub fn insert_search_log(
    conn: &Connection,
    member_id: Option<i64>,
    airport_id: i64,
    interval: &Interval,
    searched_at: &DateTime<Utc>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO search_logs (member_id, airport_id, search_date, search_time, desired_start, desired_end)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            member_id,
            airport_id,
            interval.start.date_naive().format(DATE_FORMAT).to_string(),
            fmt_ts(searched_at),
            fmt_ts(&interval.start),
            fmt_ts(&interval.end),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_search_logs(
    conn: &Connection,
    member_id: Option<i64>,
    airport_id: Option<i64>,
) -> rusqlite::Result<Vec<SearchLogEntry>> {
    let mut sql = "SELECT id, member_id, airport_id, search_date, search_time, desired_start, desired_end
                   FROM search_logs WHERE 1 = 1"
        .to_string();
    let mut args: Vec<Box<dyn ToSql>> = vec![];

    if let Some(member_id) = member_id {
        args.push(Box::new(member_id));
        sql.push_str(&format!(" AND member_id = ?{}", args.len()));
    }
    if let Some(airport_id) = airport_id {
        args.push(Box::new(airport_id));
        sql.push_str(&format!(" AND airport_id = ?{}", args.len()));
    }
    sql.push_str(" ORDER BY search_time DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let arg_refs: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref()).collect();
    let rows = stmt.query_map(arg_refs.as_slice(), |row| {
        let search_date = opt_date_col(row, 3)?
            .ok_or_else(|| conversion_error(3, "missing search_date".to_string()))?;
        Ok(SearchLogEntry {
            id: row.get(0)?,
            member_id: row.get(1)?,
            airport_id: row.get(2)?,
            search_date,
            search_time: ts_col(row, 4)?,
            desired_start: ts_col(row, 5)?,
            desired_end: ts_col(row, 6)?,
        })
    })?;
    collect(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::parse_instant;

    fn at(s: &str) -> DateTime<Utc> {
        parse_instant("t", s).unwrap()
    }

    #[test]
    fn test_timestamp_text_orders_chronologically() {
        let early = fmt_ts(&at("2025-01-01T09:59:59.5Z"));
        let late = fmt_ts(&at("2025-01-01T10:00:00Z"));
        assert!(early < late);
        assert_eq!(late, "2025-01-01T10:00:00.000000Z");
    }

    #[test]
    fn test_booking_round_trip_and_overlap_lookup() {
        let conn = db::init_db(":memory:").unwrap();
        let now = at("2024-12-01T00:00:00Z");
        let airport = insert_airport(
            &conn,
            &NewAirport {
                name: "Sydney".to_string(),
                icao_code: Some("YSSY".to_string()),
                latitude: None,
                longitude: None,
                parking_description: None,
                is_active: true,
            },
            &now,
        )
        .unwrap();
        let member = insert_member(&conn, "Ada@Example.com", None, None, MemberStatus::Verified, &now)
            .unwrap();
        assert_eq!(member.email, "ada@example.com");

        let car = insert_car(
            &conn,
            &serde_json::from_value(serde_json::json!({
                "registration": "ABC123",
                "airport_id": airport.id
            }))
            .unwrap(),
            &now,
        )
        .unwrap();

        let interval = Interval::new(at("2025-01-01T10:00:00Z"), at("2025-01-01T12:00:00Z")).unwrap();
        let booking = insert_booking(
            &conn,
            &NewBooking {
                member_id: member.id,
                car_id: car.id,
                interval,
                status: BookingStatus::Confirmed,
                created_at: now,
            },
        )
        .unwrap();
        assert_eq!(booking.start_time, interval.start);
        assert_eq!(booking.status, BookingStatus::Confirmed);

        let window = Interval::new(at("2025-01-01T11:00:00Z"), at("2025-01-01T13:00:00Z")).unwrap();
        let hit = find_overlapping_booking(&conn, car.id, &window, None).unwrap();
        assert_eq!(hit.map(|b| b.id), Some(booking.id));
        assert!(find_overlapping_booking(&conn, car.id, &window, Some(booking.id))
            .unwrap()
            .is_none());

        let touching = Interval::new(at("2025-01-01T12:00:00Z"), at("2025-01-01T13:00:00Z")).unwrap();
        assert!(find_overlapping_booking(&conn, car.id, &touching, None)
            .unwrap()
            .is_none());

        update_booking_status(&conn, booking.id, BookingStatus::Cancelled).unwrap();
        assert!(find_overlapping_booking(&conn, car.id, &window, None)
            .unwrap()
            .is_none());
    }
}

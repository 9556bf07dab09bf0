use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Airport, Car, Interval};

#[derive(Debug)]
pub struct AvailableCars {
    pub airport: Airport,
    pub cars: Vec<Car>,
}

/// Bookable cars at an active airport that hold no occupying booking over
/// `interval`, ordered by registration. Advisory: booking creation re-checks.
pub fn find_available(
    conn: &Connection,
    airport_id: i64,
    interval: &Interval,
) -> Result<AvailableCars, AppError> {
    let airport = queries::get_active_airport(conn, airport_id)?
        .ok_or_else(|| AppError::not_found(format!("airport {airport_id}")))?;

    let booked = queries::cars_booked_during(conn, airport_id, interval)?;
    let cars = queries::bookable_cars_at(conn, airport_id)?
        .into_iter()
        .filter(|car| !booked.contains(&car.id))
        .collect();

    Ok(AvailableCars { airport, cars })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{parse_instant, BookingStatus, MemberStatus, NewAirport, NewBooking};
    use chrono::{DateTime, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        parse_instant("t", s).unwrap()
    }

    fn airport(conn: &Connection, name: &str, is_active: bool) -> i64 {
        queries::insert_airport(
            conn,
            &NewAirport {
                name: name.to_string(),
                icao_code: None,
                latitude: None,
                longitude: None,
                parking_description: None,
                is_active,
            },
            &at("2024-12-01T00:00:00Z"),
        )
        .unwrap()
        .id
    }

    fn car(conn: &Connection, airport_id: i64, registration: &str, status: &str) -> i64 {
        queries::insert_car(
            conn,
            &serde_json::from_value(serde_json::json!({
                "registration": registration,
                "airport_id": airport_id,
                "status": status
            }))
            .unwrap(),
            &at("2024-12-01T00:00:00Z"),
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_excludes_booked_and_unbookable_cars() {
        let conn = db::init_db(":memory:").unwrap();
        let syd = airport(&conn, "Sydney", true);
        let other = airport(&conn, "Melbourne", true);

        let x = car(&conn, syd, "XXX111", "available");
        let y = car(&conn, syd, "YYY222", "active");
        car(&conn, syd, "ZZZ333", "maintenance");
        car(&conn, other, "AAA000", "available");

        let member = queries::insert_member(
            &conn,
            "m@example.com",
            None,
            None,
            MemberStatus::Verified,
            &at("2024-12-01T00:00:00Z"),
        )
        .unwrap();
        queries::insert_booking(
            &conn,
            &NewBooking {
                member_id: member.id,
                car_id: x,
                interval: Interval::new(at("2025-01-01T10:00:00Z"), at("2025-01-01T12:00:00Z"))
                    .unwrap(),
                status: BookingStatus::Confirmed,
                created_at: at("2024-12-01T00:00:00Z"),
            },
        )
        .unwrap();

        let wanted = Interval::new(at("2025-01-01T11:00:00Z"), at("2025-01-01T13:00:00Z")).unwrap();
        let result = find_available(&conn, syd, &wanted).unwrap();
        assert_eq!(result.airport.name, "Sydney");
        assert_eq!(result.cars.iter().map(|c| c.id).collect::<Vec<_>>(), vec![y]);

        let later = Interval::new(at("2025-01-01T12:00:00Z"), at("2025-01-01T13:00:00Z")).unwrap();
        let result = find_available(&conn, syd, &later).unwrap();
        assert_eq!(result.cars.iter().map(|c| c.id).collect::<Vec<_>>(), vec![x, y]);
    }

    #[test]
    fn test_unknown_or_inactive_airport() {
        let conn = db::init_db(":memory:").unwrap();
        let closed = airport(&conn, "Closed", false);
        let wanted = Interval::new(at("2025-01-01T11:00:00Z"), at("2025-01-01T13:00:00Z")).unwrap();

        assert!(matches!(
            find_available(&conn, closed, &wanted),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            find_available(&conn, 999, &wanted),
            Err(AppError::NotFound(_))
        ));
    }
}

use chrono::{DateTime, Utc};

use crate::models::{Airport, Booking, Car};

fn ics_time(ts: &DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Single-event calendar invite for a confirmed booking. Times are UTC.
pub fn generate_ics(booking: &Booking, car: &Car, airport: &Airport) -> String {
    let uid = format!("booking-{}@flydriveconnect", booking.id);
    let dtstamp = ics_time(&booking.created_at);
    let dtstart = ics_time(&booking.start_time);
    let dtend = ics_time(&booking.end_time);
    let car_name = car.display_name();
    let location = &airport.name;

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//FlyDrive Connect//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         SUMMARY:FlyDrive Booking - {car_name}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         LOCATION:{location}\r\n\
         DESCRIPTION:Your FlyDrive Connect booking is confirmed. Car: {car_name}, Airport: {location}.\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_instant, BookingStatus, CarStatus, PhotoSlots};

    fn at(s: &str) -> DateTime<Utc> {
        parse_instant("t", s).unwrap()
    }

    fn car(make_model: Option<&str>) -> Car {
        Car {
            id: 7,
            registration: "FLY007".to_string(),
            make_model: make_model.map(str::to_string),
            airport_id: 1,
            status: CarStatus::Available,
            price_hourly: Some(12.5),
            lockbox_ble_name: None,
            lockbox_serial: None,
            keyfob_code: None,
            image_url: None,
            carleft_url: None,
            carright_url: None,
            carback_url: None,
            carfront_url: None,
            cardash_url: None,
            created_at: at("2024-01-01T00:00:00Z"),
        }
    }

    fn airport() -> Airport {
        Airport {
            id: 1,
            name: "Sydney Kingsford Smith".to_string(),
            icao_code: Some("YSSY".to_string()),
            latitude: None,
            longitude: None,
            parking_description: None,
            is_active: true,
            created_at: at("2024-01-01T00:00:00Z"),
        }
    }

    fn booking() -> Booking {
        Booking {
            id: 42,
            member_id: 3,
            car_id: 7,
            start_time: at("2025-03-15T14:00:00+10:00"),
            end_time: at("2025-03-16T09:30:00+10:00"),
            status: BookingStatus::Confirmed,
            created_at: at("2025-03-10T10:00:00Z"),
            hire_started_at: None,
            keys_retrieved_at: None,
            photos: PhotoSlots::default(),
        }
    }

    #[test]
    fn test_generate_ics() {
        let ics = generate_ics(&booking(), &car(Some("Toyota Corolla")), &airport());
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("UID:booking-42@flydriveconnect"));
        assert!(ics.contains("DTSTART:20250315T040000Z"));
        assert!(ics.contains("DTEND:20250315T233000Z"));
        assert!(ics.contains("DTSTAMP:20250310T100000Z"));
        assert!(ics.contains("SUMMARY:FlyDrive Booking - Toyota Corolla"));
        assert!(ics.contains("LOCATION:Sydney Kingsford Smith"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn test_generate_ics_falls_back_to_registration() {
        let ics = generate_ics(&booking(), &car(None), &airport());
        assert!(ics.contains("SUMMARY:FlyDrive Booking - FLY007"));
        assert!(ics.contains("Car: FLY007, Airport: Sydney Kingsford Smith."));
    }
}

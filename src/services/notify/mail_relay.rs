use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;

use super::{confirmation_subject, confirmation_text, NotificationDispatcher};
use crate::models::{Airport, Booking, Car, Member};
use crate::services::calendar;

/// Posts confirmation mail to an HTTP relay that accepts JSON messages.
pub struct MailRelayNotifier {
    url: String,
    api_key: String,
    from_email: String,
    client: reqwest::Client,
}

impl MailRelayNotifier {
    pub fn new(url: String, api_key: String, from_email: String) -> Self {
        Self {
            url,
            api_key,
            from_email,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RelayAttachment {
    pub filename: String,
    pub content_type: String,
    /// Base64 of the raw bytes.
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct RelayMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub attachments: Vec<RelayAttachment>,
}

impl RelayMessage {
    pub fn confirmation(
        from: &str,
        member: &Member,
        booking: &Booking,
        car: &Car,
        airport: &Airport,
    ) -> Self {
        let ics = calendar::generate_ics(booking, car, airport);
        Self {
            from: from.to_string(),
            to: member.email.clone(),
            subject: confirmation_subject(booking),
            text: confirmation_text(member, booking, car, airport),
            attachments: vec![RelayAttachment {
                filename: "booking.ics".to_string(),
                content_type: "text/calendar; method=REQUEST".to_string(),
                content: base64::engine::general_purpose::STANDARD.encode(ics),
            }],
        }
    }
}

#[async_trait]
impl NotificationDispatcher for MailRelayNotifier {
    async fn send_confirmation(
        &self,
        member: &Member,
        booking: &Booking,
        car: &Car,
        airport: &Airport,
    ) -> anyhow::Result<()> {
        let message = RelayMessage::confirmation(&self.from_email, member, booking, car, airport);

        let mut request = self.client.post(&self.url).json(&message);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        request
            .send()
            .await
            .context("failed to reach mail relay")?
            .error_for_status()
            .context("mail relay returned error")?;

        tracing::info!(booking_id = booking.id, to = %member.email, "booking confirmation sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_instant, BookingStatus, CarStatus, MemberStatus, PhotoSlots};

    #[test]
    fn test_confirmation_message_carries_ics() {
        let at = |s: &str| parse_instant("t", s).unwrap();
        let member = Member {
            id: 3,
            name: Some("Ada".to_string()),
            email: "ada@example.com".to_string(),
            dob: None,
            address: None,
            renewal_date: None,
            platform: None,
            status: MemberStatus::Verified,
            licence_front_url: None,
            licence_back_url: None,
            selfie_url: None,
            licence_number: None,
            licence_expiry: None,
            created_at: at("2024-01-01T00:00:00Z"),
        };
        let car = Car {
            id: 7,
            registration: "FLY007".to_string(),
            make_model: Some("Mazda 3".to_string()),
            airport_id: 1,
            status: CarStatus::Available,
            price_hourly: None,
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
        };
        let airport = Airport {
            id: 1,
            name: "Hobart".to_string(),
            icao_code: None,
            latitude: None,
            longitude: None,
            parking_description: None,
            is_active: true,
            created_at: at("2024-01-01T00:00:00Z"),
        };
        let booking = Booking {
            id: 11,
            member_id: 3,
            car_id: 7,
            start_time: at("2025-02-01T10:00:00Z"),
            end_time: at("2025-02-01T12:00:00Z"),
            status: BookingStatus::Confirmed,
            created_at: at("2025-01-20T00:00:00Z"),
            hire_started_at: None,
            keys_retrieved_at: None,
            photos: PhotoSlots::default(),
        };

        let msg = RelayMessage::confirmation("no-reply@flydriveconnect.com", &member, &booking, &car, &airport);
        assert_eq!(msg.to, "ada@example.com");
        assert_eq!(msg.subject, "Your FlyDrive Booking #11");
        assert!(msg.text.starts_with("Hi Ada,"));
        assert!(msg.text.contains("Car: Mazda 3"));
        assert!(msg.text.contains("Airport: Hobart"));

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&msg.attachments[0].content)
            .unwrap();
        let ics = String::from_utf8(decoded).unwrap();
        assert!(ics.contains("UID:booking-11@flydriveconnect"));
    }
}

pub mod mail_relay;

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::queries;
use crate::models::{Airport, Booking, Car, Member};
use crate::state::AppState;

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_confirmation(
        &self,
        member: &Member,
        booking: &Booking,
        car: &Car,
        airport: &Airport,
    ) -> anyhow::Result<()>;
}

/// Used when no mail relay is configured.
pub struct LogNotifier;

#[async_trait]
impl NotificationDispatcher for LogNotifier {
    async fn send_confirmation(
        &self,
        member: &Member,
        booking: &Booking,
        car: &Car,
        airport: &Airport,
    ) -> anyhow::Result<()> {
        tracing::info!(
            booking_id = booking.id,
            to = %member.email,
            car = car.display_name(),
            airport = %airport.name,
            "mail relay not configured, confirmation not sent"
        );
        Ok(())
    }
}

pub fn confirmation_subject(booking: &Booking) -> String {
    format!("Your FlyDrive Booking #{}", booking.id)
}

pub fn confirmation_text(member: &Member, booking: &Booking, car: &Car, airport: &Airport) -> String {
    format!(
        "Hi {name},\n\n\
         Your FlyDrive booking is confirmed.\n\n\
         Car: {car}\n\
         Airport: {airport}\n\
         Start: {start}\n\
         End:   {end}\n\
         Status: {status}\n\n\
         You can also add this to your calendar using the attached event.\n\n\
         Safe travels,\n\
         FlyDrive Connect",
        name = member.name.as_deref().unwrap_or(""),
        car = car.display_name(),
        airport = airport.name,
        start = booking.start_time.to_rfc3339(),
        end = booking.end_time.to_rfc3339(),
        status = booking.status.as_str(),
    )
}

/// Sends the booking confirmation on a detached task. The booking is already
/// committed; any failure here is logged and dropped.
pub fn dispatch_confirmation(
    state: &Arc<AppState>,
    member: Member,
    booking: Booking,
    car: Car,
) -> tokio::task::JoinHandle<()> {
    let state = Arc::clone(state);
    tokio::spawn(async move {
        let airport = match state
            .db
            .read(|conn| Ok(queries::get_airport(conn, car.airport_id)?))
        {
            Ok(Some(airport)) => airport,
            Ok(None) => {
                tracing::warn!(booking_id = booking.id, "car has no airport, confirmation skipped");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, booking_id = booking.id, "failed to load airport for confirmation");
                return;
            }
        };

        if let Err(e) = state
            .notifier
            .send_confirmation(&member, &booking, &car, &airport)
            .await
        {
            tracing::error!(error = %e, booking_id = booking.id, "failed to send booking confirmation");
        }
    })
}

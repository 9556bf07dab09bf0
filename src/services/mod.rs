pub mod availability;
pub mod booking;
pub mod calendar;
pub mod identity;
pub mod notify;
pub mod scheduling;
pub mod telemetry;

pub mod airport;
pub mod booking;
pub mod car;
pub mod interval;
pub mod member;
pub mod photo;
pub mod rate;
pub mod search_log;
pub mod subscription;

pub use airport::{Airport, AirportUpdate, NewAirport};
pub use booking::{Booking, BookingPatch, BookingStatus, NewBooking};
pub use car::{Car, CarStatus, CarUpdate, NewCar};
pub use interval::{parse_instant, Interval};
pub use member::{Member, MemberStatus, MemberUpdate};
pub use photo::{PhotoSlot, PhotoSlots};
pub use rate::{NewRate, Rate, RateUpdate};
pub use search_log::SearchLogEntry;
pub use subscription::{NewSubscription, Subscription, SubscriptionUpdate};

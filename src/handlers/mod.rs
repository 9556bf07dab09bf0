pub mod airports;
pub mod auth;
pub mod availability;
pub mod bookings;
pub mod cars;
pub mod health;
pub mod members;
pub mod rates;
pub mod search_logs;
pub mod subscriptions;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/availability", get(availability::check_availability))
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/bookings/active", get(bookings::get_active_booking))
        .route(
            "/bookings/is-preceding-booking",
            get(bookings::is_preceding_booking),
        )
        .route(
            "/bookings/:id",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::cancel_booking),
        )
        .route("/bookings/:id/start", put(bookings::start_hire))
        .route("/bookings/:id/complete-keys", put(bookings::confirm_keys))
        .route("/bookings/:id/complete", put(bookings::complete_booking))
        .route("/bookings/:id/photo", post(bookings::set_photo))
        .route("/bookings/:id/calendar.ics", get(bookings::download_ics))
        .route(
            "/airports",
            get(airports::list_airports).post(airports::create_airport),
        )
        .route(
            "/airports/:id",
            get(airports::get_airport)
                .put(airports::update_airport)
                .delete(airports::delete_airport),
        )
        .route("/cars", get(cars::list_cars).post(cars::create_car))
        .route(
            "/cars/:id",
            get(cars::get_car)
                .put(cars::update_car)
                .delete(cars::delete_car),
        )
        .route("/members", get(members::list_members))
        .route("/members/me", get(members::get_me).put(members::update_me))
        .route("/members/:id", get(members::get_member))
        .route("/rates", get(rates::list_rates).post(rates::create_rate))
        .route("/rates/:id", put(rates::update_rate))
        .route(
            "/subscriptions",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route(
            "/subscriptions/:id",
            put(subscriptions::update_subscription),
        )
        .route("/search_logs", get(search_logs::list_search_logs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

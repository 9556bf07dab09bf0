use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::auth::{AppJson, AppQuery, CurrentMember};
use crate::db::queries::{self, BookingFilter};
use crate::errors::AppError;
use crate::models::photo::validate_photo_url;
use crate::models::{parse_instant, Booking, BookingPatch, Interval, PhotoSlot};
use crate::services::calendar::generate_ics;
use crate::services::{booking, notify, scheduling};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    pub car_id: Option<i64>,
    pub from_time: Option<String>,
    pub to_time: Option<String>,
}

// GET /bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let filter = BookingFilter {
        car_id: params.car_id,
        from_time: params
            .from_time
            .as_deref()
            .map(|raw| parse_instant("from_time", raw))
            .transpose()?,
        to_time: params
            .to_time
            .as_deref()
            .map(|raw| parse_instant("to_time", raw))
            .transpose()?,
    };
    let bookings = booking::list(&state.db, &caller, &filter, Utc::now())?;
    Ok(Json(bookings))
}

/// Unknown keys, including any attempt to name the member, are ignored:
/// the booking always belongs to the caller.
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub car_id: i64,
    pub start_time: String,
    pub end_time: String,
}

// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    AppJson(req): AppJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let interval = Interval::parse(&req.start_time, &req.end_time)?;
    let (created, car) = booking::create(&state.db, &caller, req.car_id, interval, Utc::now())?;

    notify::dispatch_confirmation(&state, caller, created.clone(), car);

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /bookings/active
pub async fn get_active_booking(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
) -> Result<Json<Option<Booking>>, AppError> {
    let active = booking::get_active(&state.db, &caller, Utc::now())?;
    Ok(Json(active))
}

#[derive(Deserialize)]
pub struct PrecedingParams {
    pub car_id: i64,
    pub start_time: String,
    pub buffer_minutes: Option<i64>,
}

// GET /bookings/is-preceding-booking
pub async fn is_preceding_booking(
    State(state): State<Arc<AppState>>,
    CurrentMember(_caller): CurrentMember,
    AppQuery(params): AppQuery<PrecedingParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let start_time = parse_instant("start_time", &params.start_time)?;
    let minutes = params
        .buffer_minutes
        .unwrap_or(scheduling::DEFAULT_PRECEDING_BUFFER_MINUTES);
    let buffer = scheduling::preceding_buffer(minutes)?;

    let preceding = booking::is_preceding_booking(&state.db, params.car_id, start_time, buffer)?;
    Ok(Json(serde_json::json!({ "is_preceding_booking": preceding })))
}

// GET /bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(booking::get(&state.db, id, &caller, Utc::now())?))
}

// PUT /bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    Path(id): Path<i64>,
    AppJson(body): AppJson<serde_json::Value>,
) -> Result<Json<Booking>, AppError> {
    let patch = BookingPatch::from_json(&body)?;
    Ok(Json(booking::update(&state.db, id, &caller, patch, Utc::now())?))
}

// DELETE /bookings/:id
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(booking::cancel(&state.db, id, &caller, Utc::now())?))
}

// PUT /bookings/:id/start
pub async fn start_hire(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(booking::start_hire(&state.db, id, &caller, Utc::now())?))
}

// PUT /bookings/:id/complete-keys
pub async fn confirm_keys(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(booking::confirm_keys(&state.db, id, &caller, Utc::now())?))
}

// PUT /bookings/:id/complete
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(booking::complete(&state.db, id, &caller, Utc::now())?))
}

#[derive(Deserialize)]
pub struct PhotoRequest {
    #[serde(alias = "phase")]
    pub photo_type: String,
    pub angle: String,
    pub url: String,
}

// POST /bookings/:id/photo
pub async fn set_photo(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    Path(id): Path<i64>,
    AppJson(req): AppJson<PhotoRequest>,
) -> Result<Json<Booking>, AppError> {
    let slot = PhotoSlot::parse(&req.photo_type, &req.angle)?;
    let url = validate_photo_url(&req.url)?;
    Ok(Json(booking::set_photo(&state.db, id, &caller, slot, url, Utc::now())?))
}

// GET /bookings/:id/calendar.ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let booking = booking::get(&state.db, id, &caller, Utc::now())?;
    let (car, airport) = state.db.read(|conn| {
        let car = queries::get_car(conn, booking.car_id)?
            .ok_or_else(|| AppError::not_found(format!("car {}", booking.car_id)))?;
        let airport = queries::get_airport(conn, car.airport_id)?
            .ok_or_else(|| AppError::not_found(format!("airport {}", car.airport_id)))?;
        Ok((car, airport))
    })?;

    let ics = generate_ics(&booking, &car, &airport);
    let disposition = format!("attachment; filename=\"booking-{id}.ics\"");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        ics,
    )
        .into_response())
}

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::auth::{AppQuery, MaybeMember};
use crate::errors::AppError;
use crate::models::{Car, Interval};
use crate::services::{availability, telemetry};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AvailabilityParams {
    pub airport_id: i64,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub airport_name: String,
    pub total_available: usize,
    pub cars: Vec<Car>,
}

// GET /availability
pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    MaybeMember(caller): MaybeMember,
    AppQuery(params): AppQuery<AvailabilityParams>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let interval = Interval::parse(&params.start_time, &params.end_time)?;
    let result = state
        .db
        .read(|conn| availability::find_available(conn, params.airport_id, &interval))?;

    telemetry::record_search(
        &state.db,
        caller.as_ref().map(|m| m.id),
        params.airport_id,
        interval,
        Utc::now(),
    );

    Ok(Json(AvailabilityResponse {
        airport_name: result.airport.name,
        total_available: result.cars.len(),
        cars: result.cars,
    }))
}

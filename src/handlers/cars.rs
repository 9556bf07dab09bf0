use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::auth::{AdminMember, AppJson, AppQuery};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Car, CarStatus, CarUpdate, NewCar};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    pub airport_id: Option<i64>,
    pub status: Option<String>,
}

pub async fn list_cars(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<Car>>, AppError> {
    let status = params
        .status
        .as_deref()
        .map(CarStatus::parse_param)
        .transpose()?;
    let cars = state
        .db
        .read(|conn| Ok(queries::list_cars(conn, params.airport_id, status)?))?;
    Ok(Json(cars))
}

pub async fn get_car(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Car>, AppError> {
    let car = state
        .db
        .read(|conn| Ok(queries::get_car(conn, id)?))?
        .ok_or_else(|| AppError::not_found(format!("car {id}")))?;
    Ok(Json(car))
}

pub async fn create_car(
    State(state): State<Arc<AppState>>,
    AdminMember(admin): AdminMember,
    AppJson(body): AppJson<NewCar>,
) -> Result<(StatusCode, Json<Car>), AppError> {
    if body.registration.trim().is_empty() {
        return Err(AppError::validation("registration must not be empty"));
    }
    let car = state.db.unit_of_work(|conn| {
        if queries::get_airport(conn, body.airport_id)?.is_none() {
            return Err(AppError::not_found(format!("airport {}", body.airport_id)));
        }
        Ok(queries::insert_car(conn, &body, &Utc::now())?)
    })?;
    tracing::info!(car_id = car.id, admin_id = admin.id, "car created");
    Ok((StatusCode::CREATED, Json(car)))
}

pub async fn update_car(
    State(state): State<Arc<AppState>>,
    AdminMember(admin): AdminMember,
    Path(id): Path<i64>,
    AppJson(body): AppJson<CarUpdate>,
) -> Result<Json<Car>, AppError> {
    let car = state.db.unit_of_work(|conn| {
        let mut car = queries::get_car(conn, id)?
            .ok_or_else(|| AppError::not_found(format!("car {id}")))?;
        if let Some(airport_id) = body.airport_id {
            if queries::get_airport(conn, airport_id)?.is_none() {
                return Err(AppError::not_found(format!("airport {airport_id}")));
            }
        }
        body.apply(&mut car);
        queries::save_car(conn, &car)?;
        Ok(car)
    })?;
    tracing::info!(car_id = id, admin_id = admin.id, status = car.status.as_str(), "car updated");
    Ok(Json(car))
}

/// Cars with booking history are kept; retire them instead.
pub async fn delete_car(
    State(state): State<Arc<AppState>>,
    AdminMember(admin): AdminMember,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.unit_of_work(|conn| {
        if queries::get_car(conn, id)?.is_none() {
            return Err(AppError::not_found(format!("car {id}")));
        }
        if queries::count_bookings_for_car(conn, id)? > 0 {
            return Err(AppError::Conflict(
                "car has bookings; set its status to retired instead".to_string(),
            ));
        }
        queries::delete_car(conn, id)?;
        Ok(())
    })?;
    tracing::info!(car_id = id, admin_id = admin.id, "car deleted");
    Ok(Json(serde_json::json!({ "ok": true })))
}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::auth::{AdminMember, AppJson, AppQuery};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Airport, AirportUpdate, NewAirport};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub active_only: bool,
}

pub async fn list_airports(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<Airport>>, AppError> {
    let airports = state
        .db
        .read(|conn| Ok(queries::list_airports(conn, params.active_only)?))?;
    Ok(Json(airports))
}

pub async fn get_airport(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Airport>, AppError> {
    let airport = state
        .db
        .read(|conn| Ok(queries::get_airport(conn, id)?))?
        .ok_or_else(|| AppError::not_found(format!("airport {id}")))?;
    Ok(Json(airport))
}

pub async fn create_airport(
    State(state): State<Arc<AppState>>,
    AdminMember(_admin): AdminMember,
    AppJson(body): AppJson<NewAirport>,
) -> Result<(StatusCode, Json<Airport>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    let airport = state
        .db
        .unit_of_work(|conn| Ok(queries::insert_airport(conn, &body, &Utc::now())?))?;
    tracing::info!(airport_id = airport.id, "airport created");
    Ok((StatusCode::CREATED, Json(airport)))
}

pub async fn update_airport(
    State(state): State<Arc<AppState>>,
    AdminMember(_admin): AdminMember,
    Path(id): Path<i64>,
    AppJson(body): AppJson<AirportUpdate>,
) -> Result<Json<Airport>, AppError> {
    let airport = state.db.unit_of_work(|conn| {
        let mut airport = queries::get_airport(conn, id)?
            .ok_or_else(|| AppError::not_found(format!("airport {id}")))?;
        body.apply(&mut airport);
        queries::save_airport(conn, &airport)?;
        Ok(airport)
    })?;
    Ok(Json(airport))
}

pub async fn delete_airport(
    State(state): State<Arc<AppState>>,
    AdminMember(_admin): AdminMember,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state
        .db
        .unit_of_work(|conn| Ok(queries::delete_airport(conn, id)?))?;
    if !deleted {
        return Err(AppError::not_found(format!("airport {id}")));
    }
    tracing::info!(airport_id = id, "airport deleted");
    Ok(Json(serde_json::json!({ "ok": true })))
}

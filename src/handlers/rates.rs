use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::auth::{AdminMember, AppJson, AppQuery};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{NewRate, Rate, RateUpdate};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub active_only: bool,
    pub airport_id: Option<i64>,
}

fn check_rate(
    hourly_rate: f64,
    active_from: Option<NaiveDate>,
    active_to: Option<NaiveDate>,
) -> Result<(), AppError> {
    if hourly_rate < 0.0 {
        return Err(AppError::validation("hourly_rate must not be negative"));
    }
    if let (Some(from), Some(to)) = (active_from, active_to) {
        if to < from {
            return Err(AppError::validation("active_to must not be before active_from"));
        }
    }
    Ok(())
}

pub async fn list_rates(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<Rate>>, AppError> {
    let rates = state
        .db
        .read(|conn| Ok(queries::list_rates(conn, params.active_only, params.airport_id)?))?;
    Ok(Json(rates))
}

pub async fn create_rate(
    State(state): State<Arc<AppState>>,
    AdminMember(_admin): AdminMember,
    AppJson(body): AppJson<NewRate>,
) -> Result<(StatusCode, Json<Rate>), AppError> {
    check_rate(body.hourly_rate, body.active_from, body.active_to)?;
    let rate = state
        .db
        .unit_of_work(|conn| Ok(queries::insert_rate(conn, &body, &Utc::now())?))?;
    Ok((StatusCode::CREATED, Json(rate)))
}

pub async fn update_rate(
    State(state): State<Arc<AppState>>,
    AdminMember(_admin): AdminMember,
    Path(id): Path<i64>,
    AppJson(body): AppJson<RateUpdate>,
) -> Result<Json<Rate>, AppError> {
    let rate = state.db.unit_of_work(|conn| {
        let mut rate = queries::get_rate(conn, id)?
            .ok_or_else(|| AppError::not_found(format!("rate {id}")))?;
        body.apply(&mut rate);
        check_rate(rate.hourly_rate, rate.active_from, rate.active_to)?;
        let now = Utc::now();
        queries::save_rate(conn, &rate, &now)?;
        rate.updated_at = Some(now);
        Ok(rate)
    })?;
    Ok(Json(rate))
}

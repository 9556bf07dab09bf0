use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::auth::{AppJson, AppQuery, CurrentMember};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{NewSubscription, Subscription, SubscriptionUpdate};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    pub member_id: Option<i64>,
    pub status: Option<String>,
}

/// Admins may list anyone's subscriptions; members only see their own.
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<Subscription>>, AppError> {
    let member_id = if caller.is_admin() {
        params.member_id
    } else {
        Some(caller.id)
    };
    let subs = state.db.read(|conn| {
        Ok(queries::list_subscriptions(
            conn,
            member_id,
            params.status.as_deref(),
        )?)
    })?;
    Ok(Json(subs))
}

pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    AppJson(mut body): AppJson<NewSubscription>,
) -> Result<(StatusCode, Json<Subscription>), AppError> {
    if !caller.is_admin() {
        body.member_id = caller.id;
    }
    let sub = state.db.unit_of_work(|conn| {
        if queries::get_member(conn, body.member_id)?.is_none() {
            return Err(AppError::not_found(format!("member {}", body.member_id)));
        }
        Ok(queries::insert_subscription(conn, &body, &Utc::now())?)
    })?;
    tracing::info!(subscription_id = sub.id, member_id = sub.member_id, "subscription created");
    Ok((StatusCode::CREATED, Json(sub)))
}

pub async fn update_subscription(
    State(state): State<Arc<AppState>>,
    CurrentMember(caller): CurrentMember,
    Path(id): Path<i64>,
    AppJson(body): AppJson<SubscriptionUpdate>,
) -> Result<Json<Subscription>, AppError> {
    let sub = state.db.unit_of_work(|conn| {
        let mut sub = queries::get_subscription(conn, id)?
            .ok_or_else(|| AppError::not_found(format!("subscription {id}")))?;
        if sub.member_id != caller.id && !caller.is_admin() {
            return Err(AppError::Forbidden("not your subscription".to_string()));
        }
        body.apply(&mut sub);
        queries::save_subscription(conn, &sub)?;
        Ok(sub)
    })?;
    Ok(Json(sub))
}

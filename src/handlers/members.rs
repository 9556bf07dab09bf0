use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use super::auth::{AdminMember, AppJson, CurrentMember};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Member, MemberUpdate};
use crate::state::AppState;

pub async fn get_me(CurrentMember(me): CurrentMember) -> Json<Member> {
    Json(me)
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    CurrentMember(me): CurrentMember,
    AppJson(body): AppJson<MemberUpdate>,
) -> Result<Json<Member>, AppError> {
    let member = state.db.unit_of_work(|conn| {
        let mut member = queries::get_member(conn, me.id)?
            .ok_or_else(|| AppError::not_found(format!("member {}", me.id)))?;
        body.apply(&mut member)?;
        queries::save_member(conn, &member)?;
        Ok(member)
    })?;
    tracing::info!(member_id = member.id, status = member.status.as_str(), "profile updated");
    Ok(Json(member))
}

pub async fn list_members(
    State(state): State<Arc<AppState>>,
    AdminMember(_admin): AdminMember,
) -> Result<Json<Vec<Member>>, AppError> {
    Ok(Json(state.db.read(|conn| Ok(queries::list_members(conn)?))?))
}

pub async fn get_member(
    State(state): State<Arc<AppState>>,
    AdminMember(_admin): AdminMember,
    Path(id): Path<i64>,
) -> Result<Json<Member>, AppError> {
    let member = state
        .db
        .read(|conn| Ok(queries::get_member(conn, id)?))?
        .ok_or_else(|| AppError::not_found(format!("member {id}")))?;
    Ok(Json(member))
}

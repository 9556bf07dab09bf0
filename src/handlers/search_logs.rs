use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::auth::{AdminMember, AppQuery};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::SearchLogEntry;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    pub member_id: Option<i64>,
    pub airport_id: Option<i64>,
}

// GET /search_logs, newest first
pub async fn list_search_logs(
    State(state): State<Arc<AppState>>,
    AdminMember(_admin): AdminMember,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<SearchLogEntry>>, AppError> {
    let logs = state.db.read(|conn| {
        Ok(queries::list_search_logs(
            conn,
            params.member_id,
            params.airport_id,
        )?)
    })?;
    Ok(Json(logs))
}

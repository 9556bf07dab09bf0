use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use crate::errors::AppError;
use crate::models::Member;
use crate::state::AppState;

/// JSON body whose rejections come back as `AppError::Validation`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string whose rejections come back as `AppError::Validation`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The authenticated caller. Missing or invalid tokens are a 401.
pub struct CurrentMember(pub Member);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let member = state.identity.authenticate(&state.db, token).await?;
        Ok(CurrentMember(member))
    }
}

/// Optional caller. An absent or unusable token yields `None`, never a 401.
pub struct MaybeMember(pub Option<Member>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(MaybeMember(None));
        };
        match state.identity.authenticate(&state.db, token).await {
            Ok(member) => Ok(MaybeMember(Some(member))),
            Err(AppError::Unauthorized) => Ok(MaybeMember(None)),
            Err(e) => Err(e),
        }
    }
}

/// An authenticated caller with the admin flag.
pub struct AdminMember(pub Member);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentMember(member) = CurrentMember::from_request_parts(parts, state).await?;
        member.require_admin()?;
        Ok(AdminMember(member))
    }
}

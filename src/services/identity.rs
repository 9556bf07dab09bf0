use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::{queries, Db};
use crate::errors::AppError;
use crate::models::{Member, MemberStatus};

/// Resolves a bearer token to the member it was issued for.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, db: &Db, token: &str) -> Result<Member, AppError>;
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Member email.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtIdentityProvider {
    secret: String,
    ttl: Duration,
}

impl JwtIdentityProvider {
    pub fn new(secret: String, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue_token(&self, email: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            sub: email.to_lowercase(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            AppError::Unauthorized
        })
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn authenticate(&self, db: &Db, token: &str) -> Result<Member, AppError> {
        let claims = self.decode_claims(token)?;
        let member = db
            .read(|conn| Ok(queries::get_member_by_email(conn, &claims.sub)?))?
            .ok_or(AppError::Unauthorized)?;

        if member.status == MemberStatus::Rejected {
            tracing::info!(member_id = member.id, "rejected member presented a token");
            return Err(AppError::Unauthorized);
        }
        Ok(member)
    }
}

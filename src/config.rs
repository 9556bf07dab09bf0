use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub db_busy_timeout_ms: u64,
    pub mail_relay_url: String,
    pub mail_relay_api_key: String,
    pub from_email: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "flydrive.db".to_string()),
            jwt_secret: env::var("JWT_SECRET_KEY").unwrap_or_default(),
            access_token_ttl_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60 * 24),
            db_busy_timeout_ms: env::var("DB_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            mail_relay_url: env::var("MAIL_RELAY_URL").unwrap_or_default(),
            mail_relay_api_key: env::var("MAIL_RELAY_API_KEY").unwrap_or_default(),
            from_email: env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "no-reply@flydriveconnect.com".to_string()),
        }
    }

    pub fn mail_relay_configured(&self) -> bool {
        !self.mail_relay_url.is_empty()
    }
}

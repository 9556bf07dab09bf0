use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use flydrive::config::AppConfig;
use flydrive::db::{self, Db};
use flydrive::handlers;
use flydrive::services::identity::JwtIdentityProvider;
use flydrive::services::notify::mail_relay::MailRelayNotifier;
use flydrive::services::notify::{LogNotifier, NotificationDispatcher};
use flydrive::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(
        !config.jwt_secret.is_empty(),
        "JWT_SECRET_KEY must be set"
    );

    let conn = db::init_db(&config.database_url)?;
    let db = Db::new(conn).with_busy_timeout(Duration::from_millis(config.db_busy_timeout_ms))?;

    let notifier: Box<dyn NotificationDispatcher> = if config.mail_relay_configured() {
        tracing::info!(url = %config.mail_relay_url, "sending confirmations through mail relay");
        Box::new(MailRelayNotifier::new(
            config.mail_relay_url.clone(),
            config.mail_relay_api_key.clone(),
            config.from_email.clone(),
        ))
    } else {
        tracing::warn!("MAIL_RELAY_URL not set, booking confirmations will only be logged");
        Box::new(LogNotifier)
    };

    let identity = JwtIdentityProvider::new(
        config.jwt_secret.clone(),
        config.access_token_ttl_minutes,
    );

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        identity: Box::new(identity),
        notifier,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

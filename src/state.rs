use crate::config::AppConfig;
use crate::db::Db;
use crate::services::identity::IdentityProvider;
use crate::services::notify::NotificationDispatcher;

pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub identity: Box<dyn IdentityProvider>,
    pub notifier: Box<dyn NotificationDispatcher>,
}

use sqlx::SqlitePool;

use crate::{config::AppConfig, session::SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub sessions: SessionStore,
    pub config: AppConfig,
}

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::Config;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.pool.clone()
    }
}

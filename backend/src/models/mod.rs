use sqlx::SqlitePool;

use crate::config::Config;

pub mod shift;
pub mod week;

pub use shift::*;
pub use week::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

use std::sync::Arc;

use crate::config::AppConfig;
use crate::registry::Registry;

pub mod health;
pub mod poll;

pub use health::health;
pub use poll::handle_poll;

/// Общее состояние HTTP обработчиков, только для чтения
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<Registry>,
}

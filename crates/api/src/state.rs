use std::sync::Arc;

use evently_events::ChangeTriggers;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: evently_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Live client sessions. Also the realtime sink behind `triggers`.
    pub ws_manager: Arc<WsManager>,
    /// Post-commit notification hooks.
    pub triggers: ChangeTriggers,
}

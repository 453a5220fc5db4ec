use std::sync::Arc;

use campusdesk_engine::TicketService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Ticket operations with per-ticket serialization.
    pub service: Arc<TicketService>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Database pool, probed by `/health`. `None` when running over the
    /// in-memory stores.
    pub pool: Option<campusdesk_db::DbPool>,
}

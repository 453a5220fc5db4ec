//! Route definitions for the `/tickets` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tickets;
use crate::state::AppState;

/// Routes mounted at `/tickets`.
///
/// ```text
/// POST   /                    -> create_ticket
/// GET    /overdue             -> list_overdue
/// GET    /{id}                -> get_ticket
/// POST   /{id}/transition     -> transition_ticket
/// POST   /{id}/assign         -> assign_ticket
/// POST   /{id}/escalate       -> escalate_ticket
/// GET    /{id}/timeline       -> get_timeline
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(tickets::create_ticket))
        .route("/overdue", get(tickets::list_overdue))
        .route("/{id}", get(tickets::get_ticket))
        .route("/{id}/transition", post(tickets::transition_ticket))
        .route("/{id}/assign", post(tickets::assign_ticket))
        .route("/{id}/escalate", post(tickets::escalate_ticket))
        .route("/{id}/timeline", get(tickets::get_timeline))
}

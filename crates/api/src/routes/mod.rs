pub mod health;
pub mod tickets;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /tickets                          create
/// /tickets/overdue                  overdue list (staff, admin)
/// /tickets/{id}                     get with live SLA assessment
/// /tickets/{id}/transition          change status (POST)
/// /tickets/{id}/assign              assign or reassign (POST)
/// /tickets/{id}/escalate            manual escalation (POST)
/// /tickets/{id}/timeline            timeline events
/// ```
///
/// Every route requires the `x-actor-*` identity headers.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/tickets", tickets::router())
}

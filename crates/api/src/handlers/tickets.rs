//! Handlers for the `/tickets` resource.
//!
//! Thin adapters over [`campusdesk_engine::TicketService`]. Reads are
//! returned with the live SLA assessment computed at request time.
//! Students may read only tickets they submitted; the overdue list is for
//! staff and administrators.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use campusdesk_core::actor::Actor;
use campusdesk_core::error::CoreError;
use campusdesk_core::status::TicketStatus;
use campusdesk_core::ticket::{CreateTicket, Ticket};
use campusdesk_core::types::DbId;
use campusdesk_engine::TicketView;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::actor::RequestActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /tickets/{id}/transition`.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Target status in kebab-case, e.g. `in-progress`.
    pub status: String,
    pub note: Option<String>,
}

/// Request body for `POST /tickets/{id}/assign`.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assignee_id: DbId,
}

/// Request body for `POST /tickets/{id}/escalate`.
#[derive(Debug, Default, Deserialize)]
pub struct EscalateRequest {
    #[serde(default)]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// POST /tickets
// ---------------------------------------------------------------------------

/// Submit a new ticket. The caller becomes the requester.
pub async fn create_ticket(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Json(input): Json<CreateTicket>,
) -> AppResult<impl IntoResponse> {
    let ticket = state.service.create_ticket(input, &actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: view(&state, ticket),
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /tickets/overdue
// ---------------------------------------------------------------------------

/// Actionable tickets past their deadline, most overdue first.
pub async fn list_overdue(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
) -> AppResult<impl IntoResponse> {
    if !actor.is_staff_or_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only staff or administrators can list overdue tickets".into(),
        )));
    }
    let overdue = state.service.list_overdue_tickets().await?;
    Ok(Json(DataResponse { data: overdue }))
}

// ---------------------------------------------------------------------------
// GET /tickets/{id}
// ---------------------------------------------------------------------------

pub async fn get_ticket(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = state.service.get_ticket(id).await?;
    ensure_can_view(&actor, &view.ticket)?;
    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// POST /tickets/{id}/transition
// ---------------------------------------------------------------------------

/// Move a ticket to another status.
///
/// Returns 409 with `current_status` and `requested_status` when the move
/// is not allowed from the ticket's current status.
pub async fn transition_ticket(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<DbId>,
    Json(input): Json<TransitionRequest>,
) -> AppResult<impl IntoResponse> {
    let requested: TicketStatus = input.status.trim().parse()?;
    let ticket = state
        .service
        .transition_ticket(id, requested, &actor, input.note)
        .await
        .map_err(|e| AppError::transition(e, requested))?;
    Ok(Json(DataResponse {
        data: view(&state, ticket),
    }))
}

// ---------------------------------------------------------------------------
// POST /tickets/{id}/assign
// ---------------------------------------------------------------------------

pub async fn assign_ticket(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<DbId>,
    Json(input): Json<AssignRequest>,
) -> AppResult<impl IntoResponse> {
    let ticket = state
        .service
        .assign_ticket(id, input.assignee_id, &actor)
        .await?;
    Ok(Json(DataResponse {
        data: view(&state, ticket),
    }))
}

// ---------------------------------------------------------------------------
// POST /tickets/{id}/escalate
// ---------------------------------------------------------------------------

/// Manual escalation. The automatic path is reserved for the scheduler.
///
/// The body is optional; a bare POST escalates without a note.
pub async fn escalate_ticket(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<DbId>,
    input: Option<Json<EscalateRequest>>,
) -> AppResult<impl IntoResponse> {
    let input = input.map(|Json(body)| body).unwrap_or_default();
    let ticket = state
        .service
        .escalate_ticket(id, Some(&actor), input.note)
        .await?;
    Ok(Json(DataResponse {
        data: view(&state, ticket),
    }))
}

// ---------------------------------------------------------------------------
// GET /tickets/{id}/timeline
// ---------------------------------------------------------------------------

pub async fn get_timeline(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !actor.is_staff_or_admin() {
        let view = state.service.get_ticket(id).await?;
        ensure_can_view(&actor, &view.ticket)?;
    }
    let events = state.service.get_ticket_timeline(id).await?;
    Ok(Json(DataResponse { data: events }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn view(state: &AppState, ticket: Ticket) -> TicketView {
    TicketView::at(ticket, state.service.now())
}

fn ensure_can_view(actor: &Actor, ticket: &Ticket) -> Result<(), AppError> {
    if actor.is_staff_or_admin() || actor.user_id == Some(ticket.requester_id) {
        return Ok(());
    }
    Err(AppError::Core(CoreError::Forbidden(
        "Students may only view tickets they submitted".into(),
    )))
}

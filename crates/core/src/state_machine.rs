//! Ticket status state machine.
//!
//! ```text
//! open -> acknowledged -> in-progress -> resolved -> closed
//!   \            \              \
//!    +------------+--------------+--> cancelled
//! ```
//!
//! `closed` and `cancelled` are terminal. Every function here is pure: it
//! takes the current ticket by reference and returns a new, advanced copy,
//! so a caller that fails to persist the result still holds the untouched
//! original. The status change and its timeline event are produced together.

use crate::actor::Actor;
use crate::error::CoreError;
use crate::status::TicketStatus;
use crate::ticket::Ticket;
use crate::timeline::{EventDraft, EventKind};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Statuses reachable from `from` in a single step.
pub fn valid_transitions(from: TicketStatus) -> &'static [TicketStatus] {
    use TicketStatus::*;
    match from {
        Open => &[Acknowledged, Cancelled],
        Acknowledged => &[InProgress, Cancelled],
        InProgress => &[Resolved, Cancelled],
        Resolved => &[Closed],
        // Terminal states
        Closed | Cancelled => &[],
    }
}

/// Check whether `from -> to` is in the transition table.
pub fn can_transition(from: TicketStatus, to: TicketStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a status change.
///
/// Terminal tickets reject everything with `TerminalStateViolation`; other
/// pairs outside the table fail with `InvalidTransition`.
pub fn validate_transition(from: TicketStatus, to: TicketStatus) -> Result<(), CoreError> {
    if from.is_terminal() {
        return Err(CoreError::TerminalStateViolation { status: from });
    }
    if !can_transition(from, to) {
        return Err(CoreError::InvalidTransition { from, to });
    }
    Ok(())
}

/// Reject any mutation of a terminal ticket.
pub fn ensure_mutable(ticket: &Ticket) -> Result<(), CoreError> {
    if ticket.status.is_terminal() {
        return Err(CoreError::TerminalStateViolation {
            status: ticket.status,
        });
    }
    Ok(())
}

fn action_for(to: TicketStatus) -> &'static str {
    match to {
        TicketStatus::Open => "Ticket reopened",
        TicketStatus::Acknowledged => "Ticket acknowledged",
        TicketStatus::InProgress => "Work started",
        TicketStatus::Resolved => "Ticket resolved",
        TicketStatus::Closed => "Ticket closed",
        TicketStatus::Cancelled => "Ticket cancelled",
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Apply a status transition, returning the advanced ticket.
///
/// Sets `resolved_at`, `closed_at` or `cancelled_at` on entering the
/// matching status and appends one `StatusChange` event. Cancelling requires
/// a reason in `note`.
pub fn transition(
    ticket: &Ticket,
    to: TicketStatus,
    actor: &Actor,
    note: Option<String>,
    now: Timestamp,
) -> Result<Ticket, CoreError> {
    validate_transition(ticket.status, to)?;

    let note = normalize_note(note);
    if to == TicketStatus::Cancelled && note.is_none() {
        return Err(CoreError::Validation(
            "Cancelling a ticket requires a reason".to_string(),
        ));
    }

    let mut next = ticket.clone();
    next.status = to;
    let event = next.timeline.append(EventDraft {
        timestamp: now,
        status: to,
        kind: EventKind::StatusChange,
        actor: actor.clone(),
        action: action_for(to).to_string(),
        note,
    });
    let at = event.timestamp;

    match to {
        TicketStatus::Resolved => next.resolved_at = Some(at),
        TicketStatus::Closed => next.closed_at = Some(at),
        TicketStatus::Cancelled => next.cancelled_at = Some(at),
        _ => {}
    }

    Ok(next)
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Rules applied when a ticket is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentPolicy {
    /// Assigning an `open` ticket also acknowledges it.
    pub auto_acknowledge: bool,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            auto_acknowledge: true,
        }
    }
}

/// Assign (or reassign) a ticket.
///
/// Assignment is metadata, recorded as an `Assignment` event. When the
/// policy's `auto_acknowledge` is on and the ticket is `open`, an explicit
/// `open -> acknowledged` transition follows, with its own event.
/// Re-assigning to the current assignee returns the ticket unchanged.
pub fn assign(
    ticket: &Ticket,
    assignee_id: DbId,
    actor: &Actor,
    policy: AssignmentPolicy,
    now: Timestamp,
) -> Result<Ticket, CoreError> {
    ensure_mutable(ticket)?;

    if ticket.assignee_id == Some(assignee_id) {
        return Ok(ticket.clone());
    }

    let action = match ticket.assignee_id {
        Some(previous) => format!("Reassigned from user {previous} to user {assignee_id}"),
        None => format!("Assigned to user {assignee_id}"),
    };

    let mut next = ticket.clone();
    next.assignee_id = Some(assignee_id);
    next.timeline.append(EventDraft {
        timestamp: now,
        status: next.status,
        kind: EventKind::Assignment,
        actor: actor.clone(),
        action,
        note: None,
    });

    if policy.auto_acknowledge && next.status == TicketStatus::Open {
        next = transition(&next, TicketStatus::Acknowledged, actor, None, now)?;
    }

    Ok(next)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

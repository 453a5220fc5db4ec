//! Escalation policy.
//!
//! Escalation raises visibility: it appends an escalation event, sets the
//! ticket's overdue hint and notifies administrators. It never changes the
//! ticket's status.
//!
//! Automatic escalation fires at most once per ticket. Manual escalation by
//! staff is always allowed on actionable tickets, even after an automatic
//! one, and repeated manual requests simply append further events.

use serde::Serialize;

use crate::actor::Actor;
use crate::error::CoreError;
use crate::notification::NotificationIntent;
use crate::overdue::{is_overdue, overdue_by};
use crate::state_machine::ensure_mutable;
use crate::ticket::Ticket;
use crate::timeline::{EventDraft, EventKind};
use crate::types::Timestamp;

/// Why an automatic escalation fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EscalationReason {
    Overdue { overdue_by_minutes: i64 },
}

/// Outcome of evaluating a ticket against the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EscalationDecision {
    /// Nothing to do: completed, cancelled, or not a candidate.
    NoAction,
    /// Overdue, actionable and never escalated before.
    AutoEscalate(EscalationReason),
    /// Actionable; staff may escalate by hand.
    EligibleForManualEscalate,
}

/// A ticket after escalation, with the intent to emit once it is persisted.
#[derive(Debug, Clone)]
pub struct Escalated {
    pub ticket: Ticket,
    pub intent: NotificationIntent,
}

/// Decide what the policy wants for `ticket` at `now`.
pub fn evaluate(ticket: &Ticket, now: Timestamp) -> EscalationDecision {
    if !ticket.status.is_actionable() {
        return EscalationDecision::NoAction;
    }
    if is_overdue(ticket, now) && !ticket.has_escalation() {
        return EscalationDecision::AutoEscalate(EscalationReason::Overdue {
            overdue_by_minutes: overdue_by(ticket, now).num_minutes(),
        });
    }
    EscalationDecision::EligibleForManualEscalate
}

/// Apply automatic escalation if the policy calls for it.
///
/// Returns `None` when the decision is anything other than
/// `AutoEscalate`; in particular a second call on an already escalated
/// ticket is a silent no-op.
pub fn auto_escalate(ticket: &Ticket, now: Timestamp) -> Option<Escalated> {
    let EscalationDecision::AutoEscalate(EscalationReason::Overdue { overdue_by_minutes }) =
        evaluate(ticket, now)
    else {
        return None;
    };

    let mut next = ticket.clone();
    next.overdue_hint = true;
    next.timeline.append(EventDraft {
        timestamp: now,
        status: next.status,
        kind: EventKind::AutoEscalation,
        actor: Actor::system(),
        action: format!(
            "Escalated to administrators: overdue by {}",
            format_minutes(overdue_by_minutes)
        ),
        note: None,
    });

    let intent = NotificationIntent::ticket_escalated(&next, None);
    Some(Escalated {
        ticket: next,
        intent,
    })
}

/// Apply a manual escalation requested by a staff member or admin.
pub fn manual_escalate(
    ticket: &Ticket,
    actor: &Actor,
    note: Option<String>,
    now: Timestamp,
) -> Result<Escalated, CoreError> {
    ensure_mutable(ticket)?;

    if actor.is_system() || !actor.is_staff_or_admin() {
        return Err(CoreError::Forbidden(
            "Only staff or administrators can escalate tickets".to_string(),
        ));
    }
    if !ticket.status.is_actionable() {
        return Err(CoreError::Validation(format!(
            "Ticket in status '{}' is no longer actionable and cannot be escalated",
            ticket.status
        )));
    }

    let overdue = is_overdue(ticket, now);
    let action = if overdue {
        format!(
            "Escalated by {}: overdue by {}",
            actor.name,
            format_minutes(overdue_by(ticket, now).num_minutes())
        )
    } else {
        format!("Escalated by {}", actor.name)
    };

    let mut next = ticket.clone();
    next.overdue_hint = next.overdue_hint || overdue;
    next.timeline.append(EventDraft {
        timestamp: now,
        status: next.status,
        kind: EventKind::ManualEscalation,
        actor: actor.clone(),
        action,
        note: note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
    });

    let intent = NotificationIntent::ticket_escalated(&next, actor.user_id);
    Ok(Escalated {
        ticket: next,
        intent,
    })
}

/// Render minutes as `"2h 5m"` / `"45m"`.
fn format_minutes(minutes: i64) -> String {
    let (hours, mins) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

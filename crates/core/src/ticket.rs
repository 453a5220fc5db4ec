//! Ticket entity and creation input.

use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::error::CoreError;
use crate::sla::{compute_deadline, Category};
use crate::status::{Priority, TicketStatus};
use crate::timeline::{EventDraft, EventKind, Timeline};
use crate::types::{DbId, Timestamp};

/// Maximum length for a ticket description.
pub const MAX_DESCRIPTION_LENGTH: usize = 5_000;

/// Width of the zero-padded numeric part of a ticket code.
const TICKET_CODE_DIGITS: usize = 6;

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

/// A facility/IT issue report.
///
/// `status`, the timestamps and the timeline change only through
/// [`crate::state_machine`] and [`crate::escalation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: DbId,
    pub code: String,
    pub category_id: DbId,
    pub priority: Priority,
    pub status: TicketStatus,
    pub requester_id: DbId,
    pub assignee_id: Option<DbId>,
    pub location_id: Option<DbId>,
    pub description: String,
    pub created_at: Timestamp,
    pub deadline: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    /// Cached hint that the ticket was seen overdue. Never authoritative;
    /// use [`crate::overdue`] for the live answer.
    pub overdue_hint: bool,
    pub timeline: Timeline,
}

impl Ticket {
    /// Materialize a ticket from a draft once the store has assigned its id
    /// and code.
    pub fn from_new(id: DbId, code: String, new: NewTicket) -> Self {
        Self {
            id,
            code,
            category_id: new.category_id,
            priority: new.priority,
            status: TicketStatus::Open,
            requester_id: new.requester_id,
            assignee_id: None,
            location_id: new.location_id,
            description: new.description,
            created_at: new.created_at,
            deadline: new.deadline,
            resolved_at: None,
            closed_at: None,
            cancelled_at: None,
            overdue_hint: false,
            timeline: new.timeline,
        }
    }

    pub fn has_escalation(&self) -> bool {
        self.timeline.has_escalation()
    }
}

/// Human-facing ticket code, e.g. `NET-000042`.
pub fn format_ticket_code(category_code: &str, id: DbId) -> String {
    format!(
        "{}-{:0width$}",
        category_code.to_uppercase(),
        id,
        width = TICKET_CODE_DIGITS
    )
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Input for `createTicket`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicket {
    pub category_id: DbId,
    /// Falls back to the category default when omitted.
    pub priority: Option<Priority>,
    pub description: String,
    pub location_id: Option<DbId>,
}

/// A fully computed ticket waiting for the store to assign identity.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub category_id: DbId,
    pub category_code: String,
    pub priority: Priority,
    pub requester_id: DbId,
    pub location_id: Option<DbId>,
    pub description: String,
    pub created_at: Timestamp,
    pub deadline: Timestamp,
    pub timeline: Timeline,
}

/// Validate a description: non-blank and within [`MAX_DESCRIPTION_LENGTH`].
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation(
            "Ticket description must not be empty".to_string(),
        ));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Build a new ticket: validate input and category, compute the deadline,
/// and record the first timeline event.
pub fn prepare_ticket(
    input: CreateTicket,
    category: &Category,
    requester: &Actor,
    now: Timestamp,
) -> Result<NewTicket, CoreError> {
    validate_description(&input.description)?;
    let sla = category.validate_for_intake()?;

    let requester_id = requester.user_id.ok_or_else(|| {
        CoreError::Validation("Tickets must be submitted by an identified user".to_string())
    })?;

    let mut timeline = Timeline::new();
    timeline.append(EventDraft {
        timestamp: now,
        status: TicketStatus::Open,
        kind: EventKind::Created,
        actor: requester.clone(),
        action: "Ticket submitted".to_string(),
        note: None,
    });

    Ok(NewTicket {
        category_id: category.id,
        category_code: category.code.clone(),
        priority: input.priority.unwrap_or(category.default_priority),
        requester_id,
        location_id: input.location_id,
        description: input.description.trim().to_string(),
        created_at: now,
        deadline: compute_deadline(now, sla),
        timeline,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::sla::CategoryStatus;
    use crate::status::ActorRole;

    fn category() -> Category {
        Category {
            id: 7,
            code: "hvac".into(),
            name: "Heating & Cooling".into(),
            department_id: None,
            sla_resolve_hours: 24,
            default_priority: Priority::High,
            status: CategoryStatus::Active,
        }
    }

    fn input(description: &str) -> CreateTicket {
        CreateTicket {
            category_id: 7,
            priority: None,
            description: description.into(),
            location_id: Some(12),
        }
    }

    fn student() -> Actor {
        Actor::user(40, "Sam", ActorRole::Student)
    }

    #[test]
    fn ticket_code_is_uppercase_and_padded() {
        assert_eq!(format_ticket_code("net", 42), "NET-000042");
        assert_eq!(format_ticket_code("IT", 1234567), "IT-1234567");
    }

    #[test]
    fn prepare_computes_deadline_and_first_event() {
        let now = Utc.with_ymd_and_hms(2026, 10, 1, 14, 0, 0).unwrap();
        let new = prepare_ticket(input("  Radiator leaking  "), &category(), &student(), now)
            .unwrap();

        assert_eq!(new.deadline, now + Duration::hours(24));
        assert_eq!(new.priority, Priority::High);
        assert_eq!(new.description, "Radiator leaking");
        assert_eq!(new.timeline.len(), 1);
        assert_eq!(new.timeline.events()[0].kind, EventKind::Created);
        assert_eq!(new.timeline.events()[0].duration_minutes, 0);
    }

    #[test]
    fn explicit_priority_overrides_category_default() {
        let now = Utc::now();
        let mut req = input("No wifi in library");
        req.priority = Some(Priority::Low);
        let new = prepare_ticket(req, &category(), &student(), now).unwrap();
        assert_eq!(new.priority, Priority::Low);
    }

    #[test]
    fn blank_description_rejected() {
        let result = prepare_ticket(input("   "), &category(), &student(), Utc::now());
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn overlong_description_rejected() {
        let long = "x".repeat(MAX_DESCRIPTION_LENGTH + 1);
        assert!(validate_description(&long).is_err());
        assert!(validate_description(&"x".repeat(MAX_DESCRIPTION_LENGTH)).is_ok());
    }

    #[test]
    fn system_actor_cannot_submit() {
        let result = prepare_ticket(input("Broken door"), &category(), &Actor::system(), Utc::now());
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn from_new_starts_open_and_unassigned() {
        let now = Utc::now();
        let new = prepare_ticket(input("Projector dead"), &category(), &student(), now).unwrap();
        let ticket = Ticket::from_new(3, format_ticket_code(&new.category_code, 3), new);
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.code, "HVAC-000003");
        assert!(ticket.assignee_id.is_none());
        assert!(!ticket.overdue_hint);
    }
}

//! `tickets` and `ticket_timeline_events` row models.

use campusdesk_core::error::CoreError;
use campusdesk_core::ticket::Ticket;
use campusdesk_core::timeline::{EventKind, Timeline, TimelineEvent};
use campusdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use uuid::Uuid;

use crate::legacy::{parse_priority, parse_role, parse_status};

/// A row from the `tickets` table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    pub id: DbId,
    pub code: String,
    pub category_id: DbId,
    pub priority: String,
    pub status: String,
    pub requester_id: DbId,
    pub assignee_id: Option<DbId>,
    pub location_id: Option<DbId>,
    pub description: String,
    pub deadline: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub overdue_hint: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `ticket_timeline_events` table.
#[derive(Debug, Clone, FromRow)]
pub struct TimelineEventRow {
    pub id: Uuid,
    pub ticket_id: DbId,
    pub seq: i32,
    pub occurred_at: Timestamp,
    pub status: String,
    pub kind: String,
    pub actor_id: Option<DbId>,
    pub actor_name: String,
    pub actor_role: String,
    pub action: String,
    pub note: Option<String>,
    pub duration_minutes: i64,
}

fn corrupt(entity: &str, id: impl std::fmt::Display, field: &str, value: &str) -> CoreError {
    CoreError::Internal(format!("{entity} {id} has unknown {field} '{value}'"))
}

impl TryFrom<TimelineEventRow> for TimelineEvent {
    type Error = CoreError;

    fn try_from(row: TimelineEventRow) -> Result<Self, Self::Error> {
        let status =
            parse_status(&row.status).ok_or_else(|| corrupt("Event", row.id, "status", &row.status))?;
        let kind =
            EventKind::parse(&row.kind).ok_or_else(|| corrupt("Event", row.id, "kind", &row.kind))?;
        let actor_role = parse_role(&row.actor_role)
            .ok_or_else(|| corrupt("Event", row.id, "actor role", &row.actor_role))?;

        Ok(TimelineEvent {
            id: row.id,
            timestamp: row.occurred_at,
            status,
            kind,
            actor_id: row.actor_id,
            actor_name: row.actor_name,
            actor_role,
            action: row.action,
            note: row.note,
            duration_minutes: row.duration_minutes,
        })
    }
}

impl TicketRow {
    /// Combine the row with its timeline events (already ordered by `seq`).
    pub fn into_ticket(self, events: Vec<TimelineEventRow>) -> Result<Ticket, CoreError> {
        let status = parse_status(&self.status)
            .ok_or_else(|| corrupt("Ticket", self.id, "status", &self.status))?;
        let priority = parse_priority(&self.priority)
            .ok_or_else(|| corrupt("Ticket", self.id, "priority", &self.priority))?;
        let events = events
            .into_iter()
            .map(TimelineEvent::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Ticket {
            id: self.id,
            code: self.code,
            category_id: self.category_id,
            priority,
            status,
            requester_id: self.requester_id,
            assignee_id: self.assignee_id,
            location_id: self.location_id,
            description: self.description,
            created_at: self.created_at,
            deadline: self.deadline,
            resolved_at: self.resolved_at,
            closed_at: self.closed_at,
            cancelled_at: self.cancelled_at,
            overdue_hint: self.overdue_hint,
            timeline: Timeline::from_persisted(events),
        })
    }
}

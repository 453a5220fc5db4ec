//! Notification intents emitted by the engine.
//!
//! The engine only says *who should hear about what*; delivery (in-app,
//! email, push) belongs to an external consumer.

use serde::{Deserialize, Serialize};

use crate::status::ActorRole;
use crate::ticket::Ticket;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    TicketCreated,
    TicketAssigned,
    TicketEscalated,
}

impl NotificationKind {
    /// Dot-separated event name used on the event bus.
    pub fn event_type(self) -> &'static str {
        match self {
            NotificationKind::TicketCreated => "ticket.created",
            NotificationKind::TicketAssigned => "ticket.assigned",
            NotificationKind::TicketEscalated => "ticket.escalated",
        }
    }
}

/// A request to notify a role (and optionally one specific user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub kind: NotificationKind,
    pub ticket_id: DbId,
    pub ticket_code: String,
    pub recipient_role: ActorRole,
    pub recipient_user_id: Option<DbId>,
    /// User that caused the intent; `None` for the scheduler.
    pub actor_id: Option<DbId>,
    pub occurred_at: Timestamp,
}

impl NotificationIntent {
    /// New submissions go to administrators for intake.
    pub fn ticket_created(ticket: &Ticket, actor_id: Option<DbId>) -> Self {
        Self::to_role(NotificationKind::TicketCreated, ticket, ActorRole::Admin, actor_id)
    }

    /// The assignee hears about their new ticket.
    pub fn ticket_assigned(ticket: &Ticket, assignee_id: DbId, actor_id: Option<DbId>) -> Self {
        let mut intent =
            Self::to_role(NotificationKind::TicketAssigned, ticket, ActorRole::Staff, actor_id);
        intent.recipient_user_id = Some(assignee_id);
        intent
    }

    /// Escalations go to administrators.
    pub fn ticket_escalated(ticket: &Ticket, actor_id: Option<DbId>) -> Self {
        Self::to_role(NotificationKind::TicketEscalated, ticket, ActorRole::Admin, actor_id)
    }

    fn to_role(
        kind: NotificationKind,
        ticket: &Ticket,
        recipient_role: ActorRole,
        actor_id: Option<DbId>,
    ) -> Self {
        let occurred_at = ticket
            .timeline
            .last()
            .map(|e| e.timestamp)
            .unwrap_or(ticket.created_at);
        Self {
            kind,
            ticket_id: ticket.id,
            ticket_code: ticket.code.clone(),
            recipient_role,
            recipient_user_id: None,
            actor_id,
            occurred_at,
        }
    }
}

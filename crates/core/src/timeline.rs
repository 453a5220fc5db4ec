//! Append-only ticket timeline (audit log).
//!
//! Every status change, assignment and escalation appends exactly one
//! [`TimelineEvent`]. Events are never reordered or edited after append.
//! Each event carries the whole minutes elapsed since the previous event of
//! the same ticket (zero for the first).

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::Actor;
use crate::status::{ActorRole, TicketStatus};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// Structural tag for a timeline event.
///
/// Duplicate-escalation detection queries this field, never the free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    StatusChange,
    Assignment,
    AutoEscalation,
    ManualEscalation,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Created,
        EventKind::StatusChange,
        EventKind::Assignment,
        EventKind::AutoEscalation,
        EventKind::ManualEscalation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::StatusChange => "status_change",
            EventKind::Assignment => "assignment",
            EventKind::AutoEscalation => "auto_escalation",
            EventKind::ManualEscalation => "manual_escalation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    pub fn is_escalation(self) -> bool {
        matches!(self, EventKind::AutoEscalation | EventKind::ManualEscalation)
    }
}

// ---------------------------------------------------------------------------
// TimelineEvent
// ---------------------------------------------------------------------------

/// One immutable entry in a ticket's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: Uuid,
    pub timestamp: Timestamp,
    /// Ticket status after this event.
    pub status: TicketStatus,
    pub kind: EventKind,
    pub actor_id: Option<DbId>,
    pub actor_name: String,
    pub actor_role: ActorRole,
    pub action: String,
    pub note: Option<String>,
    /// Whole minutes since the previous event; zero for the first.
    pub duration_minutes: i64,
}

/// The caller-supplied part of a new event. The recorder fills in the id
/// and the duration.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub timestamp: Timestamp,
    pub status: TicketStatus,
    pub kind: EventKind,
    pub actor: Actor,
    pub action: String,
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Chronologically ordered event list for a single ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a timeline from persisted events, already in append order.
    pub fn from_persisted(events: Vec<TimelineEvent>) -> Self {
        Self { events }
    }

    /// Append an event and return it.
    ///
    /// A draft timestamped earlier than the last event is pinned to the last
    /// event's timestamp so the sequence stays non-decreasing.
    pub fn append(&mut self, draft: EventDraft) -> &TimelineEvent {
        let (timestamp, duration_minutes) = match self.events.last() {
            Some(prev) => {
                let timestamp = draft.timestamp.max(prev.timestamp);
                (timestamp, (timestamp - prev.timestamp).num_minutes())
            }
            None => (draft.timestamp, 0),
        };

        self.events.push(TimelineEvent {
            id: Uuid::now_v7(),
            timestamp,
            status: draft.status,
            kind: draft.kind,
            actor_id: draft.actor.user_id,
            actor_name: draft.actor.name,
            actor_role: draft.actor.role,
            action: draft.action,
            note: draft.note,
            duration_minutes,
        });

        &self.events[self.events.len() - 1]
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&TimelineEvent> {
        self.events.last()
    }

    /// True if any escalation, automatic or manual, has been recorded.
    pub fn has_escalation(&self) -> bool {
        self.events.iter().any(|e| e.kind.is_escalation())
    }

    /// Elapsed time across the whole timeline.
    pub fn span(&self) -> Duration {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => Duration::zero(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] carries [`TicketEvent`]s from the ticket engine to whoever
//! listens: the outbox writer in production, plain receivers in tests.
//! Share it via `Arc<EventBus>`.

use campusdesk_core::notification::NotificationIntent;
use campusdesk_core::status::ActorRole;
use campusdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// TicketEvent
// ---------------------------------------------------------------------------

/// A notification-worthy change to a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEvent {
    /// Dot-separated event name, e.g. `"ticket.escalated"`.
    pub event_type: String,

    pub ticket_id: DbId,

    pub ticket_code: String,

    /// Role that should be notified.
    pub recipient_role: ActorRole,

    /// Specific user to notify, on top of the role.
    pub recipient_user_id: Option<DbId>,

    /// User that triggered the event; `None` for the scheduler.
    pub actor_user_id: Option<DbId>,

    /// The full intent as JSON, for consumers that want every field.
    pub payload: serde_json::Value,

    /// When the underlying timeline event happened (UTC).
    pub timestamp: Timestamp,
}

impl From<&NotificationIntent> for TicketEvent {
    fn from(intent: &NotificationIntent) -> Self {
        Self {
            event_type: intent.kind.event_type().to_string(),
            ticket_id: intent.ticket_id,
            ticket_code: intent.ticket_code.clone(),
            recipient_role: intent.recipient_role,
            recipient_user_id: intent.recipient_user_id,
            actor_user_id: intent.actor_id,
            payload: serde_json::to_value(intent).unwrap_or_default(),
            timestamp: intent.occurred_at,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use campusdesk_events::bus::EventBus;
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
/// assert_eq!(bus.receiver_count(), 1);
/// # drop(rx);
/// ```
pub struct EventBus {
    sender: broadcast::Sender<TicketEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: TicketEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Event published with no subscribers");
        }
    }

    /// Convert and publish a notification intent.
    pub fn publish_intent(&self, intent: &NotificationIntent) {
        tracing::debug!(
            event_type = intent.kind.event_type(),
            ticket_id = intent.ticket_id,
            "Publishing notification intent"
        );
        self.publish(TicketEvent::from(intent));
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

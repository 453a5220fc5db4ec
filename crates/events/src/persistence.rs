//! Durable outbox writer.
//!
//! [`OutboxPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes every received [`TicketEvent`] to `notification_outbox`,
//! where an external deliverer picks it up. It runs as a long-lived
//! background task and stops when the bus is dropped.

use campusdesk_core::types::DbId;
use campusdesk_db::models::outbox::CreateOutboxEntry;
use campusdesk_db::repositories::OutboxRepo;
use campusdesk_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::TicketEvent;

/// Background service that persists ticket events to the outbox.
pub struct OutboxPersistence;

impl OutboxPersistence {
    /// Run the persistence loop until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<TicketEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => match Self::persist(&pool, &event).await {
                    Ok(id) => tracing::debug!(
                        outbox_id = id,
                        event_type = %event.event_type,
                        ticket_id = event.ticket_id,
                        "Notification enqueued"
                    ),
                    Err(e) => tracing::error!(
                        error = %e,
                        event_type = %event.event_type,
                        ticket_id = event.ticket_id,
                        "Failed to enqueue notification"
                    ),
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Outbox writer lagged, some notifications were not enqueued"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, outbox writer shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(pool: &DbPool, event: &TicketEvent) -> Result<DbId, sqlx::Error> {
        OutboxRepo::insert(pool, &outbox_entry(event)).await
    }
}

fn outbox_entry(event: &TicketEvent) -> CreateOutboxEntry {
    CreateOutboxEntry {
        event_type: event.event_type.clone(),
        ticket_id: event.ticket_id,
        recipient_role: event.recipient_role.as_str().to_string(),
        recipient_user_id: event.recipient_user_id,
        actor_id: event.actor_user_id,
        payload: event.payload.clone(),
    }
}

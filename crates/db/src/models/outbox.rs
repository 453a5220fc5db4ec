//! `notification_outbox` row model.

use campusdesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notification_outbox` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutboxEntry {
    pub id: DbId,
    pub event_type: String,
    pub ticket_id: DbId,
    pub recipient_role: String,
    pub recipient_user_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub delivered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for enqueuing a notification.
#[derive(Debug, Clone)]
pub struct CreateOutboxEntry {
    pub event_type: String,
    pub ticket_id: DbId,
    pub recipient_role: String,
    pub recipient_user_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub payload: serde_json::Value,
}

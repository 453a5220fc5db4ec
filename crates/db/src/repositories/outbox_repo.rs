//! Repository for the `notification_outbox` table.

use campusdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::outbox::{CreateOutboxEntry, OutboxEntry};

/// Column list for `notification_outbox` queries.
const COLUMNS: &str = "\
    id, event_type, ticket_id, recipient_role, recipient_user_id, actor_id, \
    payload, delivered_at, created_at, updated_at";

/// Enqueue and inspect notification intents awaiting delivery.
pub struct OutboxRepo;

impl OutboxRepo {
    /// Enqueue a notification, returning the new row's ID.
    pub async fn insert(pool: &PgPool, input: &CreateOutboxEntry) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO notification_outbox \
                (event_type, ticket_id, recipient_role, recipient_user_id, actor_id, payload) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(&input.event_type)
        .bind(input.ticket_id)
        .bind(&input.recipient_role)
        .bind(input.recipient_user_id)
        .bind(input.actor_id)
        .bind(&input.payload)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    /// List undelivered notifications, oldest first.
    pub async fn list_pending(pool: &PgPool, limit: i64) -> Result<Vec<OutboxEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_outbox \
             WHERE delivered_at IS NULL \
             ORDER BY created_at ASC, id ASC \
             LIMIT $1"
        );
        sqlx::query_as::<_, OutboxEntry>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

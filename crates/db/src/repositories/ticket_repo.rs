//! Repository for the `tickets` and `ticket_timeline_events` tables.

use campusdesk_core::ticket::{format_ticket_code, NewTicket, Ticket};
use campusdesk_core::timeline::TimelineEvent;
use campusdesk_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::legacy::NORMALIZED_STATUS_SQL;
use crate::models::ticket::{TicketRow, TimelineEventRow};

/// Column list for `tickets` queries.
const COLUMNS: &str = "\
    id, code, category_id, priority, status, requester_id, assignee_id, \
    location_id, description, deadline, resolved_at, closed_at, cancelled_at, \
    overdue_hint, created_at, updated_at";

/// Column list for `ticket_timeline_events` queries.
const EVENT_COLUMNS: &str = "\
    id, ticket_id, seq, occurred_at, status, kind, actor_id, actor_name, \
    actor_role, action, note, duration_minutes";

/// Provides load/save operations for tickets and their timelines.
pub struct TicketRepo;

impl TicketRepo {
    /// Insert a new ticket and its initial timeline in one transaction.
    ///
    /// The id is reserved from the sequence first so the human-facing code
    /// can be derived from it. Returns the stored ticket row.
    pub async fn create(pool: &PgPool, new: &NewTicket) -> Result<TicketRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (id,): (DbId,) =
            sqlx::query_as("SELECT nextval(pg_get_serial_sequence('tickets', 'id'))")
                .fetch_one(&mut *tx)
                .await?;
        let code = format_ticket_code(&new.category_code, id);

        let query = format!(
            "INSERT INTO tickets \
                (id, code, category_id, priority, status, requester_id, \
                 location_id, description, deadline, created_at) \
             VALUES ($1, $2, $3, $4, 'open', $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TicketRow>(&query)
            .bind(id)
            .bind(&code)
            .bind(new.category_id)
            .bind(new.priority.as_str())
            .bind(new.requester_id)
            .bind(new.location_id)
            .bind(&new.description)
            .bind(new.deadline)
            .bind(new.created_at)
            .fetch_one(&mut *tx)
            .await?;

        Self::insert_events(&mut tx, id, 0, new.timeline.events()).await?;
        tx.commit().await?;
        Ok(row)
    }

    /// Find a ticket row by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TicketRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tickets WHERE id = $1");
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tickets in `open`, `acknowledged` or `in-progress`, oldest
    /// deadline first. Legacy status spellings are matched too.
    pub async fn list_actionable(pool: &PgPool) -> Result<Vec<TicketRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets \
             WHERE {NORMALIZED_STATUS_SQL} IN ('open', 'acknowledged', 'in-progress', 'inprogress') \
             ORDER BY deadline ASC, id ASC"
        );
        sqlx::query_as::<_, TicketRow>(&query).fetch_all(pool).await
    }

    /// Timeline events for one ticket in append order.
    pub async fn list_events(
        pool: &PgPool,
        ticket_id: DbId,
    ) -> Result<Vec<TimelineEventRow>, sqlx::Error> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM ticket_timeline_events \
             WHERE ticket_id = $1 ORDER BY seq ASC"
        );
        sqlx::query_as::<_, TimelineEventRow>(&query)
            .bind(ticket_id)
            .fetch_all(pool)
            .await
    }

    /// Timeline events for many tickets, grouped by ticket then append order.
    pub async fn list_events_for(
        pool: &PgPool,
        ticket_ids: &[DbId],
    ) -> Result<Vec<TimelineEventRow>, sqlx::Error> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM ticket_timeline_events \
             WHERE ticket_id = ANY($1) ORDER BY ticket_id ASC, seq ASC"
        );
        sqlx::query_as::<_, TimelineEventRow>(&query)
            .bind(ticket_ids)
            .fetch_all(pool)
            .await
    }

    /// Persist a ticket's mutable fields and append any timeline events
    /// beyond those already stored, atomically.
    ///
    /// Returns `false` if no ticket with that id exists.
    pub async fn save(pool: &PgPool, ticket: &Ticket) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE tickets SET \
                priority = $2, status = $3, assignee_id = $4, deadline = $5, \
                resolved_at = $6, closed_at = $7, cancelled_at = $8, \
                overdue_hint = $9, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(ticket.id)
        .bind(ticket.priority.as_str())
        .bind(ticket.status.as_str())
        .bind(ticket.assignee_id)
        .bind(ticket.deadline)
        .bind(ticket.resolved_at)
        .bind(ticket.closed_at)
        .bind(ticket.cancelled_at)
        .bind(ticket.overdue_hint)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        let (stored,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(seq), 0) FROM ticket_timeline_events WHERE ticket_id = $1",
        )
        .bind(ticket.id)
        .fetch_one(&mut *tx)
        .await?;

        let events = ticket.timeline.events();
        let already = usize::try_from(stored).unwrap_or(0).min(events.len());
        Self::insert_events(&mut tx, ticket.id, already, &events[already..]).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Insert events starting at position `offset` (0-based) in the timeline.
    ///
    /// Conflicting ids are skipped so a retried save never duplicates.
    async fn insert_events(
        tx: &mut Transaction<'_, Postgres>,
        ticket_id: DbId,
        offset: usize,
        events: &[TimelineEvent],
    ) -> Result<(), sqlx::Error> {
        for (i, event) in events.iter().enumerate() {
            let seq = i32::try_from(offset + i + 1).unwrap_or(i32::MAX);
            sqlx::query(
                "INSERT INTO ticket_timeline_events \
                    (id, ticket_id, seq, occurred_at, status, kind, actor_id, \
                     actor_name, actor_role, action, note, duration_minutes) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(event.id)
            .bind(ticket_id)
            .bind(seq)
            .bind(event.timestamp)
            .bind(event.status.as_str())
            .bind(event.kind.as_str())
            .bind(event.actor_id)
            .bind(&event.actor_name)
            .bind(event.actor_role.as_str())
            .bind(&event.action)
            .bind(&event.note)
            .bind(event.duration_minutes)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

//! `TicketStore` / `CategoryDirectory` implementations over Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use campusdesk_core::error::CoreError;
use campusdesk_core::sla::Category;
use campusdesk_core::store::{CategoryDirectory, TicketStore};
use campusdesk_core::ticket::{NewTicket, Ticket};
use campusdesk_core::types::DbId;
use sqlx::error::ErrorKind;

use crate::models::ticket::{TicketRow, TimelineEventRow};
use crate::repositories::{CategoryRepo, TicketRepo};
use crate::DbPool;

/// Map a database failure into the engine's error.
///
/// Constraint violations fail the same way on every retry and become
/// `Internal`. Everything else (pool exhaustion, dropped connections, I/O)
/// is reported as `RepositoryUnavailable`.
pub(crate) fn repository_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(
            db.kind(),
            ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
        ) {
            tracing::error!(
                error = %err,
                constraint = db.constraint().unwrap_or("unknown"),
                "Ticket repository constraint violation"
            );
            return CoreError::Internal(err.to_string());
        }
    }
    tracing::warn!(error = %err, "Ticket repository call failed");
    CoreError::RepositoryUnavailable(err.to_string())
}

/// Build tickets from loaded rows. A row whose stored values cannot be
/// read is logged and left out so the rest of the batch stays usable.
pub(crate) fn assemble_tickets(
    rows: Vec<TicketRow>,
    mut events_by_ticket: HashMap<DbId, Vec<TimelineEventRow>>,
) -> Vec<Ticket> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            let events = events_by_ticket.remove(&id).unwrap_or_default();
            match row.into_ticket(events) {
                Ok(ticket) => Some(ticket),
                Err(e) => {
                    tracing::error!(ticket_id = id, error = %e, "Skipping unreadable ticket row");
                    None
                }
            }
        })
        .collect()
}

/// Postgres-backed ticket store.
#[derive(Clone)]
pub struct PgTicketStore {
    pool: DbPool,
}

impl PgTicketStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn insert(&self, new: NewTicket) -> Result<Ticket, CoreError> {
        let row = TicketRepo::create(&self.pool, &new)
            .await
            .map_err(repository_error)?;
        let events = TicketRepo::list_events(&self.pool, row.id)
            .await
            .map_err(repository_error)?;
        row.into_ticket(events)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Ticket>, CoreError> {
        let Some(row) = TicketRepo::find_by_id(&self.pool, id)
            .await
            .map_err(repository_error)?
        else {
            return Ok(None);
        };
        let events = TicketRepo::list_events(&self.pool, id)
            .await
            .map_err(repository_error)?;
        row.into_ticket(events).map(Some)
    }

    async fn load_actionable(&self) -> Result<Vec<Ticket>, CoreError> {
        let rows = TicketRepo::list_actionable(&self.pool)
            .await
            .map_err(repository_error)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
        let mut events_by_ticket: HashMap<DbId, Vec<TimelineEventRow>> = HashMap::new();
        for event in TicketRepo::list_events_for(&self.pool, &ids)
            .await
            .map_err(repository_error)?
        {
            events_by_ticket.entry(event.ticket_id).or_default().push(event);
        }

        Ok(assemble_tickets(rows, events_by_ticket))
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), CoreError> {
        let found = TicketRepo::save(&self.pool, ticket)
            .await
            .map_err(repository_error)?;
        if !found {
            return Err(CoreError::NotFound {
                entity: "Ticket",
                id: ticket.id,
            });
        }
        Ok(())
    }
}

/// Postgres-backed category lookup.
#[derive(Clone)]
pub struct PgCategoryDirectory {
    pool: DbPool,
}

impl PgCategoryDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryDirectory for PgCategoryDirectory {
    async fn get_category(&self, id: DbId) -> Result<Option<Category>, CoreError> {
        CategoryRepo::find_by_id(&self.pool, id)
            .await
            .map_err(repository_error)?
            .map(Category::try_from)
            .transpose()
    }
}

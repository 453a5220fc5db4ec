//! Collaborator traits for storage and master data.
//!
//! The engine treats the [`TicketStore`] as the sole source of truth: it
//! reads fresh state before every mutation and never caches tickets beyond
//! a single sweep. Implementations report transient failures as
//! [`CoreError::RepositoryUnavailable`].

use async_trait::async_trait;

use crate::error::CoreError;
use crate::sla::Category;
use crate::ticket::{NewTicket, Ticket};
use crate::types::DbId;

/// Load/save access to tickets and their timelines.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persist a new ticket with its initial timeline, assigning id and code.
    async fn insert(&self, new: NewTicket) -> Result<Ticket, CoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<Ticket>, CoreError>;

    /// Every ticket whose status is `open`, `acknowledged` or `in-progress`.
    async fn load_actionable(&self) -> Result<Vec<Ticket>, CoreError>;

    /// Persist the ticket's current fields and any timeline events not yet
    /// stored. Saving the same ticket twice must be harmless.
    async fn save(&self, ticket: &Ticket) -> Result<(), CoreError>;
}

/// Read-only access to category master data.
#[async_trait]
pub trait CategoryDirectory: Send + Sync {
    async fn get_category(&self, id: DbId) -> Result<Option<Category>, CoreError>;
}

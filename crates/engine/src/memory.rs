//! In-memory `TicketStore` and `CategoryDirectory`.
//!
//! Used by the test suites and for running the engine without Postgres.
//! Semantics match the database adapter: ids come from a counter, codes
//! are derived from the category code, and saving an unknown ticket fails
//! with `NotFound`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use campusdesk_core::error::CoreError;
use campusdesk_core::sla::Category;
use campusdesk_core::store::{CategoryDirectory, TicketStore};
use campusdesk_core::ticket::{format_ticket_code, NewTicket, Ticket};
use campusdesk_core::types::DbId;
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct InMemoryTicketStore {
    tickets: RwLock<HashMap<DbId, Ticket>>,
    next_id: AtomicI64,
}

impl Default for InMemoryTicketStore {
    fn default() -> Self {
        Self {
            tickets: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a ticket in place as-is, bypassing engine rules. Test seeding only.
    pub async fn put(&self, ticket: Ticket) {
        self.next_id.fetch_max(ticket.id + 1, Ordering::SeqCst);
        self.tickets.write().await.insert(ticket.id, ticket);
    }

    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.read().await.is_empty()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn insert(&self, new: NewTicket) -> Result<Ticket, CoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let code = format_ticket_code(&new.category_code, id);
        let ticket = Ticket::from_new(id, code, new);
        self.tickets.write().await.insert(id, ticket.clone());
        Ok(ticket)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Ticket>, CoreError> {
        Ok(self.tickets.read().await.get(&id).cloned())
    }

    async fn load_actionable(&self) -> Result<Vec<Ticket>, CoreError> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .read()
            .await
            .values()
            .filter(|t| t.status.is_actionable())
            .cloned()
            .collect();
        tickets.sort_by_key(|t| (t.deadline, t.id));
        Ok(tickets)
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), CoreError> {
        let mut tickets = self.tickets.write().await;
        match tickets.get_mut(&ticket.id) {
            Some(stored) => {
                *stored = ticket.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound {
                entity: "Ticket",
                id: ticket.id,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryCategoryDirectory {
    categories: RwLock<HashMap<DbId, Category>>,
}

impl InMemoryCategoryDirectory {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: RwLock::new(categories.into_iter().map(|c| (c.id, c)).collect()),
        }
    }
}

#[async_trait]
impl CategoryDirectory for InMemoryCategoryDirectory {
    async fn get_category(&self, id: DbId) -> Result<Option<Category>, CoreError> {
        Ok(self.categories.read().await.get(&id).cloned())
    }
}

//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use campusdesk_core::actor::Actor;
use campusdesk_core::clock::ManualClock;
use campusdesk_core::error::CoreError;
use campusdesk_core::sla::{Category, CategoryStatus};
use campusdesk_core::status::{ActorRole, Priority};
use campusdesk_core::store::TicketStore;
use campusdesk_core::ticket::{CreateTicket, NewTicket, Ticket};
use campusdesk_core::types::{DbId, Timestamp};
use campusdesk_engine::{EngineConfig, InMemoryCategoryDirectory, InMemoryTicketStore, TicketService};
use campusdesk_events::EventBus;
use chrono::{TimeZone, Utc};

pub const NETWORK: DbId = 1;
pub const FACILITIES: DbId = 2;
pub const RETIRED: DbId = 3;
pub const MISCONFIGURED: DbId = 4;

pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap()
}

pub fn student() -> Actor {
    Actor::user(100, "Mika Laine", ActorRole::Student)
}

pub fn staff() -> Actor {
    Actor::user(200, "Robin Ortiz", ActorRole::Staff)
}

pub fn admin() -> Actor {
    Actor::user(300, "Sam Okafor", ActorRole::Admin)
}

fn category(id: DbId, code: &str, hours: i64, status: CategoryStatus) -> Category {
    Category {
        id,
        code: code.into(),
        name: format!("{code} desk"),
        department_id: Some(10),
        sla_resolve_hours: hours,
        default_priority: Priority::High,
        status,
    }
}

pub fn categories() -> InMemoryCategoryDirectory {
    InMemoryCategoryDirectory::new([
        category(NETWORK, "NET", 24, CategoryStatus::Active),
        category(FACILITIES, "FAC", 10, CategoryStatus::Active),
        category(RETIRED, "OLD", 24, CategoryStatus::Inactive),
        category(MISCONFIGURED, "BAD", 0, CategoryStatus::Active),
    ])
}

pub fn new_ticket(category_id: DbId, description: &str) -> CreateTicket {
    CreateTicket {
        category_id,
        priority: None,
        description: description.into(),
        location_id: Some(7),
    }
}

// ---------------------------------------------------------------------------
// Store wrapper with injectable failures
// ---------------------------------------------------------------------------

/// Wraps the in-memory store and fails or stalls on request.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryTicketStore,
    failing_saves: Mutex<HashSet<DbId>>,
    stall_reads: AtomicBool,
}

impl FlakyStore {
    pub fn fail_saves_for(&self, ticket_id: DbId) {
        self.failing_saves.lock().unwrap().insert(ticket_id);
    }

    pub fn heal(&self) {
        self.failing_saves.lock().unwrap().clear();
        self.stall_reads.store(false, Ordering::SeqCst);
    }

    pub fn stall_reads(&self) {
        self.stall_reads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TicketStore for FlakyStore {
    async fn insert(&self, new: NewTicket) -> Result<Ticket, CoreError> {
        self.inner.insert(new).await
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Ticket>, CoreError> {
        if self.stall_reads.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.inner.find_by_id(id).await
    }

    async fn load_actionable(&self) -> Result<Vec<Ticket>, CoreError> {
        self.inner.load_actionable().await
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), CoreError> {
        if self.failing_saves.lock().unwrap().contains(&ticket.id) {
            return Err(CoreError::RepositoryUnavailable(
                "connection reset by peer".into(),
            ));
        }
        self.inner.save(ticket).await
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub service: Arc<TicketService>,
    pub store: Arc<FlakyStore>,
    pub clock: Arc<ManualClock>,
    pub bus: Arc<EventBus>,
    pub config: EngineConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig {
            sweep_interval: Duration::from_secs(3600),
            repository_timeout: Duration::from_secs(1),
            ..EngineConfig::default()
        })
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let store = Arc::new(FlakyStore::default());
        let clock = Arc::new(ManualClock::new(t0()));
        let bus = Arc::new(EventBus::default());
        let service = Arc::new(TicketService::new(
            store.clone(),
            Arc::new(categories()),
            clock.clone(),
            bus.clone(),
            &config,
        ));
        Self {
            service,
            store,
            clock,
            bus,
            config,
        }
    }

    /// Submit a ticket as the default student at the current clock time.
    pub async fn submit(&self, category_id: DbId, description: &str) -> Ticket {
        self.service
            .create_ticket(new_ticket(category_id, description), &student())
            .await
            .expect("ticket creation should succeed")
    }

    pub fn advance_hours(&self, hours: i64) {
        self.clock.advance(chrono::Duration::hours(hours));
    }

    pub async fn stored(&self, ticket_id: DbId) -> Ticket {
        self.store
            .inner
            .find_by_id(ticket_id)
            .await
            .unwrap()
            .expect("ticket should exist")
    }
}

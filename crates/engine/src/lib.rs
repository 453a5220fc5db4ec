//! Ticket lifecycle and SLA escalation engine.
//!
//! [`TicketService`] is the boundary every caller goes through: HTTP
//! handlers for human-driven changes, [`EscalationScheduler`] for the
//! periodic overdue sweep. Both paths take the same per-ticket lock from
//! [`TicketLocks`], so a transition and an escalation on one ticket never
//! interleave.

pub mod config;
pub mod locks;
pub mod memory;
pub mod scheduler;
pub mod service;

pub use config::EngineConfig;
pub use locks::TicketLocks;
pub use memory::{InMemoryCategoryDirectory, InMemoryTicketStore};
pub use scheduler::{EscalationScheduler, SweepFailure, SweepReport};
pub use service::{TicketService, TicketView};

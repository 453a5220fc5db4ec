//! Ticket event bus and notification outbox.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`TicketEvent`]: the envelope every notification intent travels in.
//! - [`OutboxPersistence`]: background service that writes every event to
//!   the `notification_outbox` table for an external deliverer.

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, TicketEvent};
pub use persistence::OutboxPersistence;

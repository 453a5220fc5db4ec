//! Campus ticket lifecycle and SLA escalation domain logic.
//!
//! Everything in this crate is synchronous and free of I/O apart from the
//! collaborator traits in [`store`]. Status changes, deadlines, overdue
//! checks and escalation decisions are plain functions of their inputs and
//! an explicit `now`.

pub mod actor;
pub mod clock;
pub mod error;
pub mod escalation;
pub mod notification;
pub mod overdue;
pub mod sla;
pub mod state_machine;
pub mod status;
pub mod store;
pub mod ticket;
pub mod timeline;
pub mod types;

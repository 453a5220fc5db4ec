//! Row structs for the ticket tables.
//!
//! Each submodule contains a `FromRow` struct matching the database row and
//! the conversion into the corresponding `campusdesk_core` type.

pub mod category;
pub mod outbox;
pub mod ticket;

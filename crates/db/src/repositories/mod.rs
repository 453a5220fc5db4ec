//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod category_repo;
pub mod outbox_repo;
pub mod ticket_repo;

pub use category_repo::CategoryRepo;
pub use outbox_repo::OutboxRepo;
pub use ticket_repo::TicketRepo;

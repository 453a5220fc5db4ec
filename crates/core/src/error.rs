use crate::status::TicketStatus;
use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested status change is not in the adjacency table.
    #[error("Invalid transition: cannot move ticket from '{from}' to '{to}'")]
    InvalidTransition { from: TicketStatus, to: TicketStatus },

    /// Any mutation attempted on a `closed` or `cancelled` ticket.
    #[error("Ticket is in terminal status '{status}' and cannot be modified")]
    TerminalStateViolation { status: TicketStatus },

    /// Category SLA hours must be a positive integer.
    #[error("Invalid SLA configuration: resolve hours must be positive, got {hours}")]
    InvalidSlaConfiguration { hours: i64 },

    /// Transient storage or transport failure. Safe to retry.
    #[error("Repository unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Only repository failures are worth retrying; everything else is
    /// deterministic and would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::RepositoryUnavailable(_))
    }
}

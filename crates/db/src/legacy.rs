//! Translation of stored enum spellings into canonical core enums.
//!
//! Older rows were written by clients that mixed `open` / `OPEN` and
//! `in-progress` / `IN_PROGRESS` / `in_progress`. Reads accept any of these;
//! writes always use the canonical kebab-case form from `campusdesk_core`.

use campusdesk_core::sla::CategoryStatus;
use campusdesk_core::status::{ActorRole, Priority, TicketStatus};

/// SQL expression normalizing a status column to its canonical spelling.
///
/// Used in `WHERE` clauses so filters also match legacy rows.
pub const NORMALIZED_STATUS_SQL: &str = "replace(replace(lower(trim(status)), '_', '-'), ' ', '-')";

fn canonicalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

/// Parse a stored ticket status in any known spelling.
pub fn parse_status(raw: &str) -> Option<TicketStatus> {
    match canonicalize(raw).as_str() {
        "inprogress" => Some(TicketStatus::InProgress),
        "canceled" => Some(TicketStatus::Cancelled),
        other => other.parse().ok(),
    }
}

pub fn parse_priority(raw: &str) -> Option<Priority> {
    canonicalize(raw).parse().ok()
}

pub fn parse_role(raw: &str) -> Option<ActorRole> {
    canonicalize(raw).parse().ok()
}

pub fn parse_category_status(raw: &str) -> Option<CategoryStatus> {
    match canonicalize(raw).as_str() {
        "active" => Some(CategoryStatus::Active),
        "inactive" => Some(CategoryStatus::Inactive),
        _ => None,
    }
}

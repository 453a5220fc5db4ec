//! SLA calculator and category lookup data.
//!
//! A ticket's deadline is fixed at creation as `created_at + sla_resolve_hours`
//! of its category. Later edits to the category do not move existing
//! deadlines because the deadline is stored on the ticket, not recomputed.

use std::num::NonZeroU32;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::Priority;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// SlaHours
// ---------------------------------------------------------------------------

/// A validated, strictly positive number of resolve hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SlaHours(NonZeroU32);

impl SlaHours {
    /// Validate raw SLA hours from category master data.
    ///
    /// Zero and negative values are rejected, never clamped.
    pub fn new(hours: i64) -> Result<Self, CoreError> {
        u32::try_from(hours)
            .ok()
            .and_then(NonZeroU32::new)
            .map(SlaHours)
            .ok_or(CoreError::InvalidSlaConfiguration { hours })
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Compute a ticket deadline.
///
/// Pure UTC arithmetic: exactly `hours * 3600` seconds after `created_at`,
/// unaffected by DST changes or month boundaries.
pub fn compute_deadline(created_at: Timestamp, hours: SlaHours) -> Timestamp {
    created_at + Duration::hours(i64::from(hours.get()))
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Whether a category accepts new tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    Active,
    Inactive,
}

/// Category master data, consumed read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub department_id: Option<DbId>,
    pub sla_resolve_hours: i64,
    pub default_priority: Priority,
    pub status: CategoryStatus,
}

impl Category {
    /// Validate the category for use on a new ticket and return its SLA.
    pub fn validate_for_intake(&self) -> Result<SlaHours, CoreError> {
        if self.status != CategoryStatus::Active {
            return Err(CoreError::Validation(format!(
                "Category '{}' is inactive and does not accept new tickets",
                self.code
            )));
        }
        SlaHours::new(self.sla_resolve_hours)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

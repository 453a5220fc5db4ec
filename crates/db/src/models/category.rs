//! `categories` row model.

use campusdesk_core::error::CoreError;
use campusdesk_core::sla::Category;
use campusdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use crate::legacy::{parse_category_status, parse_priority};

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub department_id: Option<DbId>,
    pub sla_resolve_hours: i32,
    pub default_priority: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<CategoryRow> for Category {
    type Error = CoreError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let default_priority = parse_priority(&row.default_priority).ok_or_else(|| {
            CoreError::Internal(format!(
                "Category {} has unknown default priority '{}'",
                row.id, row.default_priority
            ))
        })?;
        let status = parse_category_status(&row.status).ok_or_else(|| {
            CoreError::Internal(format!(
                "Category {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(Category {
            id: row.id,
            code: row.code,
            name: row.name,
            department_id: row.department_id,
            sla_resolve_hours: i64::from(row.sla_resolve_hours),
            default_priority,
            status,
        })
    }
}

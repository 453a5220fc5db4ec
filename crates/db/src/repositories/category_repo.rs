//! Repository for the `categories` table (read-only from the engine).

use campusdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::CategoryRow;

/// Column list for `categories` queries.
const COLUMNS: &str = "\
    id, code, name, department_id, sla_resolve_hours, default_priority, \
    status, created_at, updated_at";

/// Lookup queries for category master data.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Find a category by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CategoryRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

//! Postgres persistence for campus tickets.
//!
//! Repositories follow the zero-sized-struct convention: each method takes
//! `&PgPool` as its first argument and returns `sqlx::Error`. The
//! [`store`] module adapts them to the engine's `TicketStore` and
//! `CategoryDirectory` traits.

use sqlx::postgres::PgPoolOptions;

pub mod legacy;
pub mod models;
pub mod repositories;
pub mod store;

pub use store::{PgCategoryDirectory, PgTicketStore};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

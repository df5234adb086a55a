//! Database access for the store directory.
//!
//! ## Tables
//!
//! - `users` - Accounts, password hashes, reset tokens
//! - `stores` - Store records with tags, location, and a search column
//! - `reviews` - Reviews referencing stores (back-reference, never embedded)
//! - `user_hearts` - Hearted stores per user
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations live in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p storemap-cli -- migrate
//! ```

pub mod reviews;
pub mod stores;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors from the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The requested row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value could not be interpreted.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

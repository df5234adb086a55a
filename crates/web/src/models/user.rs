//! User domain types.

use chrono::{DateTime, Utc};

use storemap_core::{Email, UserId};

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// The user's email address.
    pub email: Email,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

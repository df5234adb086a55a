//! Session-stored types.

use serde::{Deserialize, Serialize};

use storemap_core::UserId;

/// Session keys for values stored in the tower-sessions session.
pub mod session_keys {
    /// Key holding the logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}

/// The logged-in user, as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl CurrentUser {
    /// Build the session representation of a user.
    #[must_use]
    pub fn from_user(user: &crate::models::User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.as_str().to_string(),
        }
    }
}

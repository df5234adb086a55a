//! Review domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storemap_core::{ReviewId, StoreId, UserId};

/// A review of a store, with the author's display name joined in.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub store_id: StoreId,
    pub author_id: UserId,
    pub author_name: String,
    pub text: String,
    /// Star rating, 1-5.
    pub rating: i32,
    pub created: DateTime<Utc>,
}

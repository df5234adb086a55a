//! Review repository.
//!
//! Reviews reference their store by ID. They are never embedded in the
//! store row, so deleting a review can never touch store data.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storemap_core::{ReviewId, StoreId, UserId};

use super::RepositoryError;
use crate::models::Review;

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    store_id: i32,
    author_id: i32,
    author_name: String,
    text: String,
    rating: i32,
    created: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(r.id),
            store_id: StoreId::new(r.store_id),
            author_id: UserId::new(r.author_id),
            author_name: r.author_name,
            text: r.text,
            rating: r.rating,
            created: r.created,
        }
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a review and return it with the author's name joined in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, which
    /// includes foreign-key misses on the store or author.
    pub async fn insert(
        &self,
        store_id: StoreId,
        author_id: UserId,
        text: &str,
        rating: i32,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            WITH inserted AS (
                INSERT INTO reviews (store_id, author_id, text, rating)
                VALUES ($1, $2, $3, $4)
                RETURNING id, store_id, author_id, text, rating, created
            )
            SELECT i.id, i.store_id, i.author_id, u.name AS author_name,
                   i.text, i.rating, i.created
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            ",
        )
        .bind(store_id.as_i32())
        .bind(author_id.as_i32())
        .bind(text)
        .bind(rating)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// All reviews for a store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(&self, store_id: StoreId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT r.id, r.store_id, r.author_id, u.name AS author_name,
                   r.text, r.rating, r.created
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.store_id = $1
            ORDER BY r.created DESC
            ",
        )
        .bind(store_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }
}

//! User repository.
//!
//! Accounts, password hashes, the reset-token lifecycle, and the hearts
//! set all live on the user side of the schema.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storemap_core::{Email, StoreId, UserId};

use super::RepositoryError;
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, name, email, created_at";

fn row_to_user(r: UserRow) -> Result<User, RepositoryError> {
    let email = Email::parse(&r.email).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
    })?;

    Ok(User {
        id: UserId::new(r.id),
        name: r.name,
        email,
        created_at: r.created_at,
    })
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails,
    /// `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(row_to_user).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails,
    /// `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(row_to_user).transpose()
    }

    /// Create a new user with a name, email, and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists,
    /// `RepositoryError::Database` for other failures.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(name)
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row_to_user(row)
    }

    /// Get a user's password hash by email.
    ///
    /// Returns `None` if no user has that email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, (i32, String, String, DateTime<Utc>, String)>(
            r"
            SELECT id, name, email, created_at, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some((id, name, email, created_at, password_hash)) = row else {
            return Ok(None);
        };

        let user = row_to_user(UserRow {
            id,
            name,
            email,
            created_at,
        })?;

        Ok(Some((user, password_hash)))
    }

    /// Store a reset token and its expiry on the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_reset_token(
        &self,
        user_id: UserId,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET reset_token = $2, reset_expires = $3
            WHERE id = $1
            ",
        )
        .bind(user_id.as_i32())
        .bind(token)
        .bind(expires)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Find the user holding an unexpired reset token.
    ///
    /// Both conditions (token match, not expired) are checked in the same
    /// query so validity cannot drift between check and use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_valid_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE reset_token = $1 AND reset_expires > $2
            "
        ))
        .bind(token)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        row.map(row_to_user).transpose()
    }

    /// Set a new password hash and clear the reset token in one update.
    ///
    /// The token-match condition makes the consume single-use: a concurrent
    /// reset that already cleared the token turns this into a no-op miss.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the token was already consumed
    /// or the user doesn't exist.
    pub async fn consume_reset_token(
        &self,
        user_id: UserId,
        token: &str,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET password_hash = $3, reset_token = NULL, reset_expires = NULL
            WHERE id = $1 AND reset_token = $2
            ",
        )
        .bind(user_id.as_i32())
        .bind(token)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// IDs of the stores this user has hearted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn heart_ids(&self, user_id: UserId) -> Result<Vec<StoreId>, RepositoryError> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT store_id FROM user_hearts WHERE user_id = $1 ORDER BY created DESC",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().map(StoreId::new).collect())
    }

    /// Toggle a store in the user's hearts set: remove it when present,
    /// add it otherwise. Runs in one transaction so concurrent toggles
    /// cannot double-insert. Returns the updated hearts set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn toggle_heart(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Vec<StoreId>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM user_hearts WHERE user_id = $1 AND store_id = $2",
        )
        .bind(user_id.as_i32())
        .bind(store_id.as_i32())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if toggle_inserts(removed) {
            sqlx::query(
                r"
                INSERT INTO user_hearts (user_id, store_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(user_id.as_i32())
            .bind(store_id.as_i32())
            .execute(&mut *tx)
            .await?;
        }

        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT store_id FROM user_hearts WHERE user_id = $1 ORDER BY created DESC",
        )
        .bind(user_id.as_i32())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ids.into_iter().map(StoreId::new).collect())
    }
}

/// The toggle decision: the delete runs first, and only a miss (the store
/// was not hearted) turns the toggle into an insert.
const fn toggle_inserts(removed_rows: u64) -> bool {
    removed_rows == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_removes_when_present_adds_when_absent() {
        // Not hearted: the delete hits nothing, so the toggle inserts.
        assert!(toggle_inserts(0));
        // Hearted: the delete removed the row, and the toggle stops there.
        assert!(!toggle_inserts(1));
    }

    #[test]
    fn test_toggle_twice_is_an_involution() {
        // Simulate the delete-then-maybe-insert sequence from either
        // starting state; two toggles always land back where they began.
        for started_hearted in [false, true] {
            let mut hearted = started_hearted;
            for _ in 0..2 {
                let removed = u64::from(hearted);
                hearted = toggle_inserts(removed);
            }
            assert_eq!(hearted, started_hearted);
        }
    }
}

//! Account recovery.
//!
//! The reset-token lifecycle: issue a token by email, validate it, and
//! consume it exactly once to set a new password.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;

use storemap_core::Email;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;
use crate::services::auth::{self, AuthError};
use crate::services::email::{EmailError, Mailer};

/// Random bytes in a reset token (hex-encoded to twice this length).
const TOKEN_BYTES: usize = 20;

/// How long a reset token stays valid.
const TOKEN_TTL_HOURS: i64 = 1;

/// Account recovery service.
pub struct AccountRecovery<'a> {
    users: UserRepository<'a>,
    mailer: &'a Mailer,
    base_url: &'a str,
}

impl<'a> AccountRecovery<'a> {
    /// Create a new account recovery service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, mailer: &'a Mailer, base_url: &'a str) -> Self {
        Self {
            users: UserRepository::new(pool),
            mailer,
            base_url,
        }
    }

    /// Issue a reset token for the account with this email and send the
    /// reset link.
    ///
    /// Unknown emails are a silent no-op. Callers must respond the same
    /// way in both cases so the endpoint cannot be used to probe which
    /// emails have accounts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` on database failure,
    /// `EmailError` (wrapped) if the mail cannot be sent.
    pub async fn request_reset(&self, email: &str) -> Result<(), RecoveryError> {
        let Ok(email) = Email::parse(email) else {
            // Malformed input gets the same silence as an unknown address.
            return Ok(());
        };

        let Some(user) = self.users.get_by_email(&email).await? else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(());
        };

        let token = generate_token();
        let expires = token_expiry(Utc::now());

        self.users.set_reset_token(user.id, &token, expires).await?;

        let reset_url = format!("{}/account/reset/{token}", self.base_url);
        self.mailer
            .send_password_reset(user.email.as_str(), &user.name, &reset_url)
            .await?;

        tracing::info!(user_id = %user.id, "password reset token issued");

        Ok(())
    }

    /// Check whether a token is currently valid, returning its user.
    ///
    /// # Errors
    ///
    /// Returns `RecoveryError::InvalidOrExpiredToken` if the token is
    /// unknown or expired.
    pub async fn validate_token(&self, token: &str) -> Result<User, RecoveryError> {
        self.users
            .find_by_valid_reset_token(token, Utc::now())
            .await?
            .ok_or(RecoveryError::Auth(AuthError::InvalidOrExpiredToken))
    }

    /// Complete a reset: set the new password and consume the token.
    ///
    /// The token is re-validated here, not just at the form render, so a
    /// token that expired while the form sat open is still rejected.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch`, `AuthError::WeakPassword`,
    /// or `AuthError::InvalidOrExpiredToken` (all wrapped).
    pub async fn complete_reset(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, RecoveryError> {
        // Cheap checks first, before touching the token.
        if password != password_confirm {
            return Err(RecoveryError::Auth(AuthError::PasswordMismatch));
        }
        auth::validate_password(password).map_err(RecoveryError::Auth)?;

        let user = self.validate_token(token).await?;

        let password_hash = auth::hash_password(password).map_err(RecoveryError::Auth)?;

        self.users
            .consume_reset_token(user.id, token, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => {
                    RecoveryError::Auth(AuthError::InvalidOrExpiredToken)
                }
                other => RecoveryError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "password reset completed");

        Ok(user)
    }
}

/// Errors from account recovery operations.
#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    /// Authentication-level failure (bad token, weak password, mismatch).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// The reset email could not be sent.
    #[error("email error: {0}")]
    Email(#[from] EmailError),
}

/// Generate a hex-encoded reset token from 20 random bytes.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// When a token issued at `now` stops being valid.
fn token_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(TOKEN_TTL_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_token_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_token_expiry_is_one_hour_out() {
        let now = Utc::now();
        assert_eq!(token_expiry(now) - now, Duration::hours(1));
    }

    #[test]
    fn test_token_expiry_is_in_the_future() {
        let now = Utc::now();
        assert!(token_expiry(now) > now);
    }
}

//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::email::EmailError;
use crate::services::media::MediaError;
use crate::services::recovery::RecoveryError;
use crate::services::stores::StoreError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Photo processing failed.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Outgoing mail failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RecoveryError> for AppError {
    fn from(e: RecoveryError) -> Self {
        match e {
            RecoveryError::Auth(e) => Self::Auth(e),
            RecoveryError::Repository(e) => Self::Database(e),
            RecoveryError::Email(e) => Self::Email(e),
        }
    }
}

impl AppError {
    /// Whether this error should be reported to Sentry.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Email(_) => true,
            Self::Store(StoreError::Repository(_)) => true,
            Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash) => true,
            Self::Media(MediaError::Io(_) | MediaError::TaskCancelled) => true,
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // A page past the end of the list bounces back to the index
        // instead of erroring.
        if matches!(self, Self::Store(StoreError::PageOutOfRange { .. })) {
            return Redirect::to("/stores").into_response();
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) | Self::Email(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Store(err) => match err {
                StoreError::Validation(_) => StatusCode::BAD_REQUEST,
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::NotOwner => StatusCode::FORBIDDEN,
                StoreError::PageOutOfRange { .. } => StatusCode::SEE_OTHER,
                StoreError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::PasswordMismatch
                | AuthError::EmptyName
                | AuthError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Media(err) => match err {
                MediaError::UnsupportedFileType(_) | MediaError::Decode(_) => {
                    StatusCode::BAD_REQUEST
                }
                MediaError::Io(_) | MediaError::TaskCancelled => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) | Self::Email(_) => {
                "Internal server error".to_string()
            }
            Self::Store(err) => match err {
                StoreError::Repository(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::PasswordMismatch => "Passwords do not match".to_string(),
                AuthError::EmptyName => "Please supply a name".to_string(),
                AuthError::InvalidOrExpiredToken => {
                    "Password reset link is invalid or has expired".to_string()
                }
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
            },
            Self::Media(err) => match err {
                MediaError::Io(_) | MediaError::TaskCancelled => {
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            },
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("cafe-rio".to_string());
        assert_eq!(err.to_string(), "Not found: cafe-rio");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(
            get_status(AppError::Store(StoreError::NotOwner)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::Validation("bad".into()))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_page_out_of_range_redirects() {
        let response =
            AppError::Store(StoreError::PageOutOfRange { page: 9, pages: 3 }).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some("/stores")
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidOrExpiredToken)),
            StatusCode::BAD_REQUEST
        );
    }
}

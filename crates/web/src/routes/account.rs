//! Password reset handlers.
//!
//! The forgot-password endpoint answers identically whether or not the
//! email has an account, so it cannot be used to probe for accounts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::middleware::{OptionalAuth, set_current_user};
use crate::models::CurrentUser;
use crate::routes::auth::MessageQuery;
use crate::services::recovery::AccountRecovery;
use crate::state::AppState;

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetForm {
    pub password: String,
    pub password_confirm: String,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/forgot.html")]
pub struct ForgotTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/reset.html")]
pub struct ResetTemplate {
    pub current_user: Option<CurrentUser>,
    pub token: String,
    pub error: Option<String>,
}

/// Display the forgot password page.
pub async fn forgot_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    ForgotTemplate {
        current_user,
        error: query.error,
        success: query.success,
    }
}

/// Handle forgot password form submission.
///
/// Always responds with the same redirect, whether or not a reset was
/// actually issued.
pub async fn forgot(State(state): State<AppState>, Form(form): Form<ForgotForm>) -> Response {
    let recovery = AccountRecovery::new(state.pool(), state.mailer(), &state.config().base_url);

    if let Err(e) = recovery.request_reset(&form.email).await {
        // Internal failure, not a bad address. Same response either way.
        tracing::error!("Password reset request failed: {}", e);
    }

    Redirect::to("/account/forgot?success=email_sent").into_response()
}

/// Display the reset password form for a token.
///
/// Expired or unknown tokens bounce back to the forgot page.
pub async fn reset_page(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(token): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Response {
    let recovery = AccountRecovery::new(state.pool(), state.mailer(), &state.config().base_url);

    match recovery.validate_token(&token).await {
        Ok(_) => ResetTemplate {
            current_user,
            token,
            error: query.error,
        }
        .into_response(),
        Err(e) => {
            tracing::debug!("Reset token rejected: {}", e);
            Redirect::to("/account/forgot?error=invalid_token").into_response()
        }
    }
}

/// Handle reset password form submission.
///
/// The token is validated again here; a successful reset logs the user in.
pub async fn reset(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<ResetForm>,
) -> Response {
    let recovery = AccountRecovery::new(state.pool(), state.mailer(), &state.config().base_url);

    match recovery
        .complete_reset(&token, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => {
            let current = CurrentUser::from_user(&user);
            if let Err(e) = set_current_user(&session, &current).await {
                tracing::error!("Failed to set session after password reset: {}", e);
                return Redirect::to("/login?success=password_reset").into_response();
            }

            Redirect::to("/stores").into_response()
        }
        Err(e) => {
            tracing::warn!("Password reset failed: {}", e);
            use crate::services::auth::AuthError;
            use crate::services::recovery::RecoveryError;
            let code = match &e {
                RecoveryError::Auth(AuthError::PasswordMismatch) => "password_mismatch",
                RecoveryError::Auth(AuthError::WeakPassword(_)) => "password_too_short",
                RecoveryError::Auth(AuthError::InvalidOrExpiredToken) => {
                    return Redirect::to("/account/forgot?error=invalid_token").into_response();
                }
                _ => "failed",
            };
            Redirect::to(&format!("/account/reset/{token}?error={code}")).into_response()
        }
    }
}

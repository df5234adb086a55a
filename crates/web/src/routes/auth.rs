//! Login, registration, and logout handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        current_user,
        error: query.error,
        success: query.success,
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let auth = AuthService::new(state.pool());

    match auth.login(&form.email, &form.password).await {
        Ok(user) => {
            let current = CurrentUser::from_user(&user);
            if let Err(e) = set_current_user(&session, &current).await {
                tracing::error!("Failed to set session: {}", e);
                return Redirect::to("/login?error=session").into_response();
            }

            set_sentry_user(&user.id, Some(user.email.as_str()));
            Redirect::to("/stores").into_response()
        }
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            Redirect::to("/login?error=credentials").into_response()
        }
    }
}

/// Display the registration page.
pub async fn register_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    RegisterTemplate {
        current_user,
        error: query.error,
    }
}

/// Handle registration form submission.
///
/// Registration logs the new user straight in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let auth = AuthService::new(state.pool());

    match auth
        .register(&form.name, &form.email, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => {
            let current = CurrentUser::from_user(&user);
            if let Err(e) = set_current_user(&session, &current).await {
                tracing::error!("Failed to set session after registration: {}", e);
                return Redirect::to("/login?error=session").into_response();
            }

            set_sentry_user(&user.id, Some(user.email.as_str()));
            Redirect::to("/stores").into_response()
        }
        Err(e) => {
            tracing::warn!("Registration failed: {}", e);
            let code = match e {
                AuthError::UserAlreadyExists => "email_taken",
                AuthError::PasswordMismatch => "password_mismatch",
                AuthError::WeakPassword(_) => "password_too_short",
                AuthError::InvalidEmail(_) => "invalid_email",
                AuthError::EmptyName => "missing_name",
                _ => "failed",
            };
            Redirect::to(&format!("/register?error={code}")).into_response()
        }
    }
}

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    // Destroy the entire session, not just the user key
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    clear_sentry_user();

    Redirect::to("/").into_response()
}

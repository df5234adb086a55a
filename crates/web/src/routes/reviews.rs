//! Review submission handler.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use storemap_core::StoreId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::stores::StoreService;
use crate::state::AppState;

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub text: String,
    pub rating: i32,
}

/// Add a review to a store and bounce back to its page.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let service = StoreService::new(state.pool());
    let store_id = StoreId::new(id);

    let store = service.get_by_id(store_id).await?;

    service
        .add_review(user.id, store_id, &form.text, form.rating)
        .await?;

    tracing::info!(store_id = %store_id, "review added");

    Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
}

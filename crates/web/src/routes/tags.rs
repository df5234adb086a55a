//! Tag browsing handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::models::store::Store;
use crate::services::stores::StoreService;
use crate::state::AppState;

/// One tag link on the tags page, with its URL precomputed so tags with
/// spaces ("Open Late") link correctly.
pub struct TagLink {
    pub tag: String,
    pub count: i64,
    pub url: String,
}

/// Tags page template. `active_tag` is empty when no tag is selected.
#[derive(Template, WebTemplate)]
#[template(path = "stores/tags.html")]
pub struct TagsTemplate {
    pub current_user: Option<CurrentUser>,
    pub tags: Vec<TagLink>,
    pub stores: Vec<Store>,
    pub active_tag: String,
}

/// Tags overview: the frequency table plus every tagged store.
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
) -> Result<Response> {
    render(&state, current_user, None).await
}

/// Stores for one tag.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(tag): Path<String>,
) -> Result<Response> {
    render(&state, current_user, Some(tag)).await
}

async fn render(
    state: &AppState,
    current_user: Option<CurrentUser>,
    tag: Option<String>,
) -> Result<Response> {
    let service = StoreService::new(state.pool());
    let (counts, stores) = service.tags_page(tag.as_deref()).await?;

    let tags = counts
        .into_iter()
        .map(|c| TagLink {
            url: format!("/tags/{}", urlencoding::encode(&c.tag)),
            tag: c.tag,
            count: c.count,
        })
        .collect();

    Ok(TagsTemplate {
        current_user,
        tags,
        stores,
        active_tag: tag.unwrap_or_default(),
    }
    .into_response())
}

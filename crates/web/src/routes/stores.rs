//! Store page handlers.
//!
//! Listing, detail, create/edit forms (multipart, for the photo upload),
//! the map page, the top-ten page, and the hearted-stores page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};

use storemap_core::StoreId;

use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::CurrentUser;
use crate::models::store::{Store, TopStore};
use crate::models::Review;
use crate::services::stores::{StoreError, StoreInput, StoreService};
use crate::state::AppState;

/// Tag choices offered on the store form.
pub const TAG_CHOICES: &[&str] = &["Wifi", "Open Late", "Family Friendly", "Vegetarian", "Licensed"];

// =============================================================================
// Templates
// =============================================================================

/// Paginated store index template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/index.html")]
pub struct StoresTemplate {
    pub current_user: Option<CurrentUser>,
    pub stores: Vec<Store>,
    pub heart_ids: Vec<StoreId>,
    pub page: i64,
    pub pages: i64,
    pub total: i64,
}

impl StoresTemplate {
    /// Whether the viewing user has hearted this store.
    fn is_hearted(&self, id: &StoreId) -> bool {
        self.heart_ids.contains(id)
    }
}

/// Store detail template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/show.html")]
pub struct StoreShowTemplate {
    pub current_user: Option<CurrentUser>,
    pub store: Store,
    pub author_name: Option<String>,
    pub reviews: Vec<Review>,
}

/// Store create/edit form template. `store` is `None` for the add form.
#[derive(Template, WebTemplate)]
#[template(path = "stores/edit.html")]
pub struct StoreEditTemplate {
    pub current_user: Option<CurrentUser>,
    pub store: Option<Store>,
    pub tag_choices: &'static [&'static str],
}

impl StoreEditTemplate {
    /// Whether the store being edited already carries this tag.
    fn has_tag(&self, tag: &str) -> bool {
        self.store
            .as_ref()
            .is_some_and(|s| s.tags.iter().any(|t| t == tag))
    }
}

/// Top stores template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/top.html")]
pub struct TopStoresTemplate {
    pub current_user: Option<CurrentUser>,
    pub stores: Vec<TopStore>,
}

/// Hearted stores template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/hearts.html")]
pub struct HeartsTemplate {
    pub current_user: Option<CurrentUser>,
    pub stores: Vec<Store>,
}

/// Map page template.
#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub current_user: Option<CurrentUser>,
}

// =============================================================================
// Handlers
// =============================================================================

/// First page of the store index.
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
) -> Result<Response> {
    render_page(&state, current_user, 1).await
}

/// A specific page of the store index.
pub async fn index_page(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(page): Path<i64>,
) -> Result<Response> {
    render_page(&state, current_user, page).await
}

async fn render_page(
    state: &AppState,
    current_user: Option<CurrentUser>,
    page: i64,
) -> Result<Response> {
    let service = StoreService::new(state.pool());

    let store_page = service.list_paged(page).await?;
    let heart_ids = heart_ids_for(&service, current_user.as_ref()).await?;

    Ok(StoresTemplate {
        current_user,
        stores: store_page.stores,
        heart_ids,
        page: store_page.page,
        pages: store_page.pages,
        total: store_page.total,
    }
    .into_response())
}

/// Store detail page, with reviews.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<Response> {
    let service = StoreService::new(state.pool());

    let detail = service.find_by_slug(&slug, true).await.map_err(|e| match e {
        StoreError::NotFound => AppError::NotFound(slug.clone()),
        other => AppError::Store(other),
    })?;

    Ok(StoreShowTemplate {
        current_user,
        store: detail.store,
        author_name: detail.author.map(|u| u.name),
        reviews: detail.reviews,
    }
    .into_response())
}

/// Blank store form.
pub async fn add_page(RequireAuth(user): RequireAuth) -> impl IntoResponse {
    StoreEditTemplate {
        current_user: Some(user),
        store: None,
        tag_choices: TAG_CHOICES,
    }
}

/// Create a store from the multipart form.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<Response> {
    let input = parse_store_form(&state, multipart).await?;

    let service = StoreService::new(state.pool());
    let store = service.create(user.id, input).await?;

    tracing::info!(store_id = %store.id, slug = %store.slug, "store created");

    Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
}

/// Edit form for an existing store. Only the owner gets the form.
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    let service = StoreService::new(state.pool());
    let store = service.confirm_owner(user.id, StoreId::new(id)).await?;

    Ok(StoreEditTemplate {
        current_user: Some(user),
        store: Some(store),
        tag_choices: TAG_CHOICES,
    }
    .into_response())
}

/// Update a store from the multipart form.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response> {
    let input = parse_store_form(&state, multipart).await?;

    let service = StoreService::new(state.pool());
    let store = service.update(user.id, StoreId::new(id), input).await?;

    tracing::info!(store_id = %store.id, "store updated");

    Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
}

/// Top ten stores by average rating.
pub async fn top(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
) -> Result<Response> {
    let service = StoreService::new(state.pool());
    let stores = service.top_stores().await?;

    Ok(TopStoresTemplate {
        current_user,
        stores,
    }
    .into_response())
}

/// Stores the logged-in user has hearted.
pub async fn hearts(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let service = StoreService::new(state.pool());
    let stores = service.hearted(user.id).await?;

    Ok(HeartsTemplate {
        current_user: Some(user),
        stores,
    }
    .into_response())
}

/// Map page. Stores are loaded client-side from the near API.
pub async fn map(OptionalAuth(current_user): OptionalAuth) -> impl IntoResponse {
    MapTemplate { current_user }
}

// =============================================================================
// Form Parsing
// =============================================================================

/// Pull the store fields out of a multipart submission, storing the photo
/// if one was uploaded.
async fn parse_store_form(state: &AppState, mut multipart: Multipart) -> Result<StoreInput> {
    let mut name = String::new();
    let mut description = None;
    let mut address = String::new();
    let mut longitude = None;
    let mut latitude = None;
    let mut tags = Vec::new();
    let mut photo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed form: {e}")))?
    {
        let Some(field_name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        if field_name == "photo" {
            let content_type = field.content_type().map(ToOwned::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("upload failed: {e}")))?;

            // An empty file input still submits a zero-length part
            if let Some(content_type) = content_type
                && !bytes.is_empty()
            {
                let filename = state
                    .media()
                    .process_upload(&content_type, bytes.to_vec())
                    .await?;
                photo = Some(filename);
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("malformed form: {e}")))?;

        match field_name.as_str() {
            "name" => name = value,
            "description" => description = Some(value),
            "address" => address = value,
            "longitude" => longitude = Some(parse_coord(&value, "longitude")?),
            "latitude" => latitude = Some(parse_coord(&value, "latitude")?),
            "tags" => tags.push(value),
            _ => {}
        }
    }

    let longitude =
        longitude.ok_or_else(|| AppError::BadRequest("missing longitude".to_string()))?;
    let latitude = latitude.ok_or_else(|| AppError::BadRequest("missing latitude".to_string()))?;

    Ok(StoreInput {
        name,
        description,
        tags,
        longitude,
        latitude,
        address,
        photo,
    })
}

fn parse_coord(value: &str, label: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::BadRequest(format!("{label} must be a number")))
}

async fn heart_ids_for(
    service: &StoreService<'_>,
    user: Option<&CurrentUser>,
) -> Result<Vec<StoreId>> {
    match user {
        Some(u) => Ok(service.heart_ids(u.id).await?),
        None => Ok(Vec::new()),
    }
}

//! JSON API handlers.
//!
//! Backs the search-as-you-type box, the map, and the heart buttons.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use storemap_core::StoreId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::store::{Store, StoreCard};
use crate::services::stores::{StoreError, StoreService};
use crate::state::AppState;

/// Query parameters for text search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Query parameters for geospatial search.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lng: f64,
    pub lat: f64,
}

/// Response body for a heart toggle.
#[derive(Debug, Serialize)]
pub struct HeartsResponse {
    pub hearts: Vec<StoreId>,
}

/// Full-text store search. An empty query returns an empty list.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Store>>> {
    let service = StoreService::new(state.pool());
    let stores = service.search_text(&query.q).await?;

    Ok(Json(stores))
}

/// Stores near a point, for the map.
pub async fn near(
    State(state): State<AppState>,
    Query(query): Query<NearQuery>,
) -> Result<Json<Vec<StoreCard>>> {
    let service = StoreService::new(state.pool());

    let stores = service
        .search_near(query.lng, query.lat)
        .await
        .map_err(|e| match e {
            StoreError::Validation(msg) => AppError::BadRequest(msg),
            other => AppError::Store(other),
        })?;

    Ok(Json(stores))
}

/// Toggle a heart on a store. Returns the user's updated heart set.
pub async fn toggle_heart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<HeartsResponse>> {
    let service = StoreService::new(state.pool());
    let hearts = service.toggle_heart(user.id, StoreId::new(id)).await?;

    Ok(Json(HeartsResponse { hearts }))
}

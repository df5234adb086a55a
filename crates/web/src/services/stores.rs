//! Store directory service.
//!
//! Validation, slug assignment, ownership checks, and the read paths
//! the pages are built from. Slugs are computed here at save time, as
//! an explicit step, so the rules are visible in one place.

use sqlx::PgPool;
use thiserror::Error;

use storemap_core::{Slug, StoreId, UserId};

use crate::db::RepositoryError;
use crate::db::reviews::ReviewRepository;
use crate::db::stores::{NewStore, StorePatch, StoreRepository};
use crate::db::users::UserRepository;
use crate::models::store::{Store, StoreCard, TagCount, TopStore};
use crate::models::{Review, User};

/// Stores per page on the paginated index.
pub const PAGE_SIZE: i64 = 4;

/// Result cap for text search.
const TEXT_SEARCH_LIMIT: i64 = 5;

/// Geospatial search radius in meters.
const NEAR_RADIUS_M: f64 = 10_000.0;

/// Result cap for geospatial search.
const NEAR_LIMIT: i64 = 10;

/// Result cap for the top-rated list.
const TOP_LIMIT: i64 = 10;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The store does not exist.
    #[error("store not found")]
    NotFound,

    /// The acting user does not own the store.
    #[error("you must own a store in order to edit it")]
    NotOwner,

    /// The requested page is past the end of the store list.
    #[error("page {page} does not exist, there are only {pages} pages")]
    PageOutOfRange {
        /// The page that was asked for.
        page: i64,
        /// The number of pages that exist.
        pages: i64,
    },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Validated input for creating or updating a store.
#[derive(Debug, Clone)]
pub struct StoreInput {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub address: String,
    /// Processed photo filename, if a new photo was uploaded.
    pub photo: Option<String>,
}

impl StoreInput {
    /// Trim and validate the input fields.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the name or address is blank
    /// or the coordinates are not finite values in range.
    pub fn validated(mut self) -> Result<Self, StoreError> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(StoreError::Validation("please enter a store name".into()));
        }

        self.address = self.address.trim().to_owned();
        if self.address.is_empty() {
            return Err(StoreError::Validation("please supply an address".into()));
        }

        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(StoreError::Validation(
                "longitude must be between -180 and 180".into(),
            ));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(StoreError::Validation(
                "latitude must be between -90 and 90".into(),
            ));
        }

        self.description = self
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        self.tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(self)
    }
}

/// One page of the store index.
#[derive(Debug)]
pub struct StorePage {
    pub stores: Vec<Store>,
    pub page: i64,
    pub pages: i64,
    pub total: i64,
}

/// A store with its author and (optionally) its reviews loaded.
#[derive(Debug)]
pub struct StoreDetail {
    pub store: Store,
    pub author: Option<User>,
    /// Empty when reviews were not requested.
    pub reviews: Vec<Review>,
}

/// Store directory service.
pub struct StoreService<'a> {
    pool: &'a PgPool,
    stores: StoreRepository<'a>,
    reviews: ReviewRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> StoreService<'a> {
    /// Create a new store service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            stores: StoreRepository::new(pool),
            reviews: ReviewRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// Create a store owned by `author_id`.
    ///
    /// The slug is derived from the name and suffixed (`-2`, `-3`, ...)
    /// when it would collide with an existing one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for bad input, `StoreError::Repository`
    /// for database failures, including a lost slug race.
    pub async fn create(&self, author_id: UserId, input: StoreInput) -> Result<Store, StoreError> {
        let input = input.validated()?;

        let slug = self.unique_slug(&input.name, None).await?;

        let store = self
            .stores
            .insert(&NewStore {
                name: input.name,
                slug,
                description: input.description,
                tags: input.tags,
                longitude: input.longitude,
                latitude: input.latitude,
                address: input.address,
                photo: input.photo,
                author_id,
            })
            .await?;

        Ok(store)
    }

    /// Update a store. Only the owner may edit.
    ///
    /// The slug is recomputed only when the name changed; an edit that
    /// keeps the name keeps the slug, suffix and all.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the store doesn't exist,
    /// `StoreError::NotOwner` if `user_id` doesn't own it,
    /// `StoreError::Validation` for bad input.
    pub async fn update(
        &self,
        user_id: UserId,
        store_id: StoreId,
        input: StoreInput,
    ) -> Result<Store, StoreError> {
        let input = input.validated()?;

        let existing = self.confirm_owner(user_id, store_id).await?;

        let slug = if input.name == existing.name {
            existing.slug
        } else {
            self.unique_slug(&input.name, Some(store_id)).await?
        };

        let store = self
            .stores
            .update(
                store_id,
                &StorePatch {
                    name: input.name,
                    slug,
                    description: input.description,
                    tags: input.tags,
                    longitude: input.longitude,
                    latitude: input.latitude,
                    address: input.address,
                    photo: input.photo,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => StoreError::NotFound,
                other => StoreError::Repository(other),
            })?;

        Ok(store)
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the store doesn't exist.
    pub async fn get_by_id(&self, store_id: StoreId) -> Result<Store, StoreError> {
        self.stores
            .find_by_id(store_id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Get a store by ID, checking that `user_id` owns it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` or `StoreError::NotOwner`.
    pub async fn confirm_owner(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Store, StoreError> {
        let store = self
            .stores
            .find_by_id(store_id)
            .await?
            .ok_or(StoreError::NotFound)?;

        if !store.is_owned_by(user_id) {
            return Err(StoreError::NotOwner);
        }

        Ok(store)
    }

    /// One page of stores, newest first. Pages are 1-based.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PageOutOfRange` when the page is past the end
    /// and stores exist, so the caller can bounce back to the index
    /// instead of rendering an empty page.
    pub async fn list_paged(&self, page: i64) -> Result<StorePage, StoreError> {
        let page = page.max(1);
        let skip = (page - 1) * PAGE_SIZE;

        let total = self.stores.count_all().await?;
        let pages = (total + PAGE_SIZE - 1) / PAGE_SIZE;

        let stores = self.stores.list_page(skip, PAGE_SIZE).await?;

        if stores.is_empty() && skip > 0 {
            return Err(StoreError::PageOutOfRange { page, pages });
        }

        Ok(StorePage {
            stores,
            page,
            pages,
            total,
        })
    }

    /// Look up a store by slug, with its author and optionally its reviews.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no store has that slug.
    pub async fn find_by_slug(
        &self,
        slug: &str,
        include_reviews: bool,
    ) -> Result<StoreDetail, StoreError> {
        let store = self
            .stores
            .find_by_slug(slug)
            .await?
            .ok_or(StoreError::NotFound)?;

        let author = self.users.get_by_id(store.author_id).await?;

        let reviews = if include_reviews {
            self.reviews.list_for_store(store.id).await?
        } else {
            Vec::new()
        };

        Ok(StoreDetail {
            store,
            author,
            reviews,
        })
    }

    /// The tag frequency table plus the stores for one tag. With no tag
    /// selected, lists every store that has at least one tag.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn tags_page(
        &self,
        tag: Option<&str>,
    ) -> Result<(Vec<TagCount>, Vec<Store>), StoreError> {
        let counts = self.stores.tag_counts().await?;
        let stores = match tag {
            Some(t) => self.stores.with_tag(t).await?,
            None => self.stores.with_any_tag().await?,
        };

        Ok((counts, stores))
    }

    /// Full-text search over names and descriptions, best match first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn search_text(&self, query: &str) -> Result<Vec<Store>, StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.stores.search_text(query, TEXT_SEARCH_LIMIT).await?)
    }

    /// Stores within 10km of a point, closest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the coordinates are out of range.
    pub async fn search_near(
        &self,
        longitude: f64,
        latitude: f64,
    ) -> Result<Vec<StoreCard>, StoreError> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(StoreError::Validation(
                "longitude must be between -180 and 180".into(),
            ));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(StoreError::Validation(
                "latitude must be between -90 and 90".into(),
            ));
        }

        Ok(self
            .stores
            .search_near(longitude, latitude, NEAR_RADIUS_M, NEAR_LIMIT)
            .await?)
    }

    /// Top ten stores by average rating, two-review minimum.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn top_stores(&self) -> Result<Vec<TopStore>, StoreError> {
        Ok(self.stores.top_rated(TOP_LIMIT).await?)
    }

    /// The stores a user has hearted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn hearted(&self, user_id: UserId) -> Result<Vec<Store>, StoreError> {
        Ok(self.stores.hearted_by(user_id).await?)
    }

    /// Toggle a heart and return the user's updated heart set.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the store doesn't exist.
    pub async fn toggle_heart(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Vec<StoreId>, StoreError> {
        if self.stores.find_by_id(store_id).await?.is_none() {
            return Err(StoreError::NotFound);
        }

        Ok(self.users.toggle_heart(user_id, store_id).await?)
    }

    /// IDs of the stores a user has hearted, for rendering heart state.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` on database failure.
    pub async fn heart_ids(&self, user_id: UserId) -> Result<Vec<StoreId>, StoreError> {
        Ok(self.users.heart_ids(user_id).await?)
    }

    /// Add a review to a store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the text is blank or the rating
    /// is outside 1-5, `StoreError::NotFound` if the store doesn't exist.
    pub async fn add_review(
        &self,
        author_id: UserId,
        store_id: StoreId,
        text: &str,
        rating: i32,
    ) -> Result<Review, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::Validation("please enter a review".into()));
        }
        if !(1..=5).contains(&rating) {
            return Err(StoreError::Validation(
                "rating must be between 1 and 5".into(),
            ));
        }

        if self.stores.find_by_id(store_id).await?.is_none() {
            return Err(StoreError::NotFound);
        }

        Ok(self.reviews.insert(store_id, author_id, text, rating).await?)
    }

    /// Direct pool access for callers composing their own queries.
    #[must_use]
    pub const fn pool(&self) -> &'a PgPool {
        self.pool
    }

    /// Derive a slug from a name and suffix it past any existing siblings.
    async fn unique_slug(&self, name: &str, exclude: Option<StoreId>) -> Result<Slug, StoreError> {
        let base = Slug::from_name(name);
        if base.is_empty() {
            return Err(StoreError::Validation(
                "store name must contain at least one letter or digit".into(),
            ));
        }

        let siblings = self.stores.count_slug_siblings(&base, exclude).await?;

        Ok(base.deduplicated(siblings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> StoreInput {
        StoreInput {
            name: name.to_owned(),
            description: Some("  good coffee  ".to_owned()),
            tags: vec!["Wifi".to_owned(), "  ".to_owned()],
            longitude: -122.3,
            latitude: 47.6,
            address: "123 Pike St".to_owned(),
            photo: None,
        }
    }

    #[test]
    fn test_validated_trims_and_drops_blank_fields() {
        let v = input("  Cafe Rio  ").validated().expect("valid");
        assert_eq!(v.name, "Cafe Rio");
        assert_eq!(v.description.as_deref(), Some("good coffee"));
        assert_eq!(v.tags, vec!["Wifi".to_owned()]);
    }

    #[test]
    fn test_validated_rejects_blank_name() {
        assert!(matches!(
            input("   ").validated(),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_validated_rejects_bad_coordinates() {
        let mut i = input("Cafe");
        i.longitude = 200.0;
        assert!(matches!(i.validated(), Err(StoreError::Validation(_))));

        let mut i = input("Cafe");
        i.latitude = f64::NAN;
        assert!(matches!(i.validated(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_page_count_rounds_up() {
        // 9 stores at 4 per page is 3 pages
        let total: i64 = 9;
        let pages = (total + PAGE_SIZE - 1) / PAGE_SIZE;
        assert_eq!(pages, 3);
    }
}

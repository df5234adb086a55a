//! Store repository.
//!
//! All derived-data queries live here: slug sibling counting, the tag
//! frequency aggregation, full-text and geospatial search, and the
//! top-rated aggregation over the `reviews` back-reference.

use sqlx::PgPool;

use storemap_core::{Slug, StoreId, UserId};

use super::RepositoryError;
use crate::models::store::{Location, Store, StoreCard, TagCount, TopStore};

/// Fields for inserting a new store. Slug is computed by the service
/// before the insert, never by a persistence hook.
#[derive(Debug)]
pub struct NewStore {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub address: String,
    pub photo: Option<String>,
    pub author_id: UserId,
}

/// Fields for updating an existing store. `author_id` and `created` are
/// deliberately absent: they are immutable after creation. A `photo` of
/// `None` keeps the stored photo.
#[derive(Debug)]
pub struct StorePatch {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub address: String,
    pub photo: Option<String>,
}

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    tags: Vec<String>,
    created: chrono::DateTime<chrono::Utc>,
    longitude: f64,
    latitude: f64,
    address: String,
    photo: Option<String>,
    author_id: i32,
}

impl From<StoreRow> for Store {
    fn from(r: StoreRow) -> Self {
        Self {
            id: StoreId::new(r.id),
            name: r.name,
            slug: Slug::from_raw(r.slug),
            description: r.description,
            tags: r.tags,
            created: r.created,
            location: Location {
                longitude: r.longitude,
                latitude: r.latitude,
                address: r.address,
            },
            photo: r.photo,
            author_id: UserId::new(r.author_id),
        }
    }
}

#[derive(sqlx::FromRow)]
struct StoreCardRow {
    slug: String,
    name: String,
    description: Option<String>,
    longitude: f64,
    latitude: f64,
    address: String,
    photo: Option<String>,
}

impl From<StoreCardRow> for StoreCard {
    fn from(r: StoreCardRow) -> Self {
        Self {
            slug: Slug::from_raw(r.slug),
            name: r.name,
            description: r.description,
            location: crate::models::store::Point::new(r.longitude, r.latitude),
            address: r.address,
            photo: r.photo,
        }
    }
}

const STORE_COLUMNS: &str =
    "id, name, slug, description, tags, created, longitude, latitude, address, photo, author_id";

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is already taken
    /// (lost race against a concurrent insert), `RepositoryError::Database`
    /// for other failures.
    pub async fn insert(&self, new: &NewStore) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            INSERT INTO stores (name, slug, description, tags, longitude, latitude, address, photo, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(&new.name)
        .bind(new.slug.as_str())
        .bind(&new.description)
        .bind(&new.tags)
        .bind(new.longitude)
        .bind(new.latitude)
        .bind(&new.address)
        .bind(&new.photo)
        .bind(new.author_id.as_i32())
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique)?;

        Ok(row.into())
    }

    /// Apply a patch to an existing store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    pub async fn update(&self, id: StoreId, patch: &StorePatch) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            UPDATE stores
            SET name = $2, slug = $3, description = $4, tags = $5,
                longitude = $6, latitude = $7, address = $8,
                photo = COALESCE($9, photo)
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(&patch.name)
        .bind(patch.slug.as_str())
        .bind(&patch.description)
        .bind(&patch.tags)
        .bind(patch.longitude)
        .bind(patch.latitude)
        .bind(&patch.address)
        .bind(&patch.photo)
        .fetch_optional(self.pool)
        .await
        .map_err(conflict_on_unique)?;

        row.map(Store::from).ok_or(RepositoryError::NotFound)
    }

    /// Get a store by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Store::from))
    }

    /// Get a store by its slug (exact match).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Store::from))
    }

    /// Count stores whose slug matches the base slug's sibling pattern
    /// (`base`, `base-2`, ...), case-insensitively.
    ///
    /// `exclude` skips the store being renamed so it doesn't count itself.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_slug_siblings(
        &self,
        base: &Slug,
        exclude: Option<StoreId>,
    ) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM stores
            WHERE slug ~* $1
              AND ($2::INTEGER IS NULL OR id <> $2)
            ",
        )
        .bind(base.sibling_pattern())
        .bind(exclude.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await?;

        Ok(count.unsigned_abs())
    }

    /// Total number of stores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_all(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// One page of stores, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_page(&self, skip: i64, limit: i64) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            SELECT {STORE_COLUMNS}
            FROM stores
            ORDER BY created DESC
            OFFSET $1 LIMIT $2
            "
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    /// Stores carrying the given tag, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn with_tag(&self, tag: &str) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            SELECT {STORE_COLUMNS}
            FROM stores
            WHERE $1 = ANY(tags)
            ORDER BY created DESC
            "
        ))
        .bind(tag)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    /// Stores with at least one tag, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn with_any_tag(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            SELECT {STORE_COLUMNS}
            FROM stores
            WHERE cardinality(tags) > 0
            ORDER BY created DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    /// Tag frequency table: every tag across all stores with its count,
    /// most frequent first. Order among equal counts is unspecified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tag_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r"
            SELECT tag, COUNT(*) AS count
            FROM stores, unnest(tags) AS tag
            GROUP BY tag
            ORDER BY count DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(tag, count)| TagCount { tag, count })
            .collect())
    }

    /// Full-text relevance search over name + description, best match first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search_text(&self, query: &str, limit: i64) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            SELECT {STORE_COLUMNS}
            FROM stores
            WHERE search @@ websearch_to_tsquery('english', $1)
            ORDER BY ts_rank(search, websearch_to_tsquery('english', $1)) DESC
            LIMIT $2
            "
        ))
        .bind(query)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    /// Nearest stores within `max_distance_m` meters of a point, closest
    /// first, projected to the card fields.
    ///
    /// The `earth_box` test narrows via the GIST index; `earth_distance`
    /// gives the exact cutoff and ordering.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search_near(
        &self,
        longitude: f64,
        latitude: f64,
        max_distance_m: f64,
        limit: i64,
    ) -> Result<Vec<StoreCard>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreCardRow>(
            r"
            SELECT slug, name, description, longitude, latitude, address, photo
            FROM stores
            WHERE earth_box(ll_to_earth($2, $1), $3) @> ll_to_earth(latitude, longitude)
              AND earth_distance(ll_to_earth(latitude, longitude), ll_to_earth($2, $1)) <= $3
            ORDER BY earth_distance(ll_to_earth(latitude, longitude), ll_to_earth($2, $1)) ASC
            LIMIT $4
            ",
        )
        .bind(longitude)
        .bind(latitude)
        .bind(max_distance_m)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(StoreCard::from).collect())
    }

    /// Top stores by average review rating, best first.
    ///
    /// Only stores with two or more reviews participate; a store with a
    /// single glowing review is excluded, not scored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_rated(&self, limit: i64) -> Result<Vec<TopStore>, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, String, Option<String>, i64, f64)>(
            r"
            SELECT s.name, s.slug, s.photo,
                   COUNT(r.id) AS review_count,
                   AVG(r.rating)::DOUBLE PRECISION AS average_rating
            FROM stores s
            JOIN reviews r ON r.store_id = s.id
            GROUP BY s.id
            HAVING COUNT(r.id) >= 2
            ORDER BY average_rating DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(name, slug, photo, review_count, average_rating)| TopStore {
                    name,
                    slug: Slug::from_raw(slug),
                    photo,
                    review_count,
                    average_rating,
                },
            )
            .collect())
    }

    /// Stores the given user has hearted, most recently hearted first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearted_by(&self, user_id: UserId) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT s.id, s.name, s.slug, s.description, s.tags, s.created,
                   s.longitude, s.latitude, s.address, s.photo, s.author_id
            FROM stores s
            JOIN user_hearts h ON h.store_id = s.id
            WHERE h.user_id = $1
            ORDER BY h.created DESC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }
}

/// Translate a unique-violation into `Conflict`, everything else into
/// `Database`.
fn conflict_on_unique(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("slug already exists".to_owned());
    }
    RepositoryError::Database(e)
}

//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storemap_core::{Slug, StoreId, UserId};

/// A store record.
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    /// Unique store ID, assigned at creation.
    pub id: StoreId,
    /// Display name.
    pub name: String,
    /// URL slug, unique across all stores.
    pub slug: Slug,
    /// Optional description.
    pub description: Option<String>,
    /// Tag labels, in the order the author picked them.
    pub tags: Vec<String>,
    /// Creation time, immutable.
    pub created: DateTime<Utc>,
    /// Where the store is.
    pub location: Location,
    /// Uploaded photo filename, if any.
    pub photo: Option<String>,
    /// The user who registered the store. Immutable after creation.
    pub author_id: UserId,
}

impl Store {
    /// Whether `user_id` owns this store.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }
}

/// A geographic location with a display address.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
    pub address: String,
}

impl Location {
    /// GeoJSON-style point representation (`[longitude, latitude]`).
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

/// GeoJSON-style point, serialized as `{"type": "Point", "coordinates": [lng, lat]}`.
#[derive(Debug, Clone, Serialize)]
pub struct Point {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: [f64; 2],
}

impl Point {
    /// Build a point from a longitude/latitude pair.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: "Point",
            coordinates: [longitude, latitude],
        }
    }
}

/// Projection of a store for search and map results.
#[derive(Debug, Clone, Serialize)]
pub struct StoreCard {
    pub slug: Slug,
    pub name: String,
    pub description: Option<String>,
    pub location: Point,
    pub address: String,
    pub photo: Option<String>,
}

/// One row of the tag frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// One row of the top-stores aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct TopStore {
    pub name: String,
    pub slug: Slug,
    pub photo: Option<String>,
    pub review_count: i64,
    pub average_rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_owned_by() {
        let store = Store {
            id: StoreId::new(1),
            name: "Cafe Rio".to_string(),
            slug: Slug::from_name("Cafe Rio"),
            description: None,
            tags: vec![],
            created: Utc::now(),
            location: Location {
                longitude: -122.3,
                latitude: 47.6,
                address: "Seattle".to_string(),
            },
            photo: None,
            author_id: UserId::new(7),
        };

        assert!(store.is_owned_by(UserId::new(7)));
        assert!(!store.is_owned_by(UserId::new(8)));
    }

    #[test]
    fn test_point_serialization() {
        let location = Location {
            longitude: -122.3,
            latitude: 47.6,
            address: "Seattle".to_string(),
        };
        let json = serde_json::to_value(location.point()).expect("serialize");
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], -122.3);
        assert_eq!(json["coordinates"][1], 47.6);
    }
}

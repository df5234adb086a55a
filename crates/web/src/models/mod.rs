//! Domain models.
//!
//! These types represent validated domain objects separate from database
//! row types.

pub mod review;
pub mod session;
pub mod store;
pub mod user;

pub use review::Review;
pub use session::{CurrentUser, session_keys};
pub use store::{Location, Point, Store, StoreCard, TagCount, TopStore};
pub use user::User;

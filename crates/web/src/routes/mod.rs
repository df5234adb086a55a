//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Store index (first page)
//! GET  /health                 - Health check
//!
//! # Stores
//! GET  /stores                 - Store index (first page)
//! GET  /stores/page/{page}     - Store index, paginated
//! GET  /store/{slug}           - Store detail with reviews
//! GET  /add                    - Store form (requires auth)
//! POST /add                    - Create store (multipart)
//! POST /add/{id}               - Update store (multipart)
//! GET  /stores/{id}/edit       - Edit form (owner only)
//! GET  /top                    - Top ten stores by rating
//! GET  /map                    - Map page
//! GET  /hearts                 - Hearted stores (requires auth)
//!
//! # Tags
//! GET  /tags                   - Tag frequency table, all tagged stores
//! GET  /tags/{tag}             - Stores for one tag
//!
//! # Reviews
//! POST /reviews/{id}           - Add review to store (requires auth)
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /register               - Register page
//! POST /register               - Register action
//! POST /logout                 - Logout action
//!
//! # Account recovery
//! GET  /account/forgot         - Forgot password page
//! POST /account/forgot         - Request reset (uniform response)
//! GET  /account/reset/{token}  - Reset form (validates token)
//! POST /account/reset/{token}  - Complete reset
//!
//! # API
//! GET  /api/search?q=          - Full-text search (JSON)
//! GET  /api/stores/near?lng=&lat= - Stores within 10km (JSON)
//! POST /api/stores/{id}/heart  - Toggle heart (JSON, requires auth)
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod reviews;
pub mod stores;
pub mod tags;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the store page routes.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/stores", get(stores::index))
        .route("/stores/page/{page}", get(stores::index_page))
        .route("/stores/{id}/edit", get(stores::edit_page))
        .route("/store/{slug}", get(stores::show))
        .route("/add", get(stores::add_page).post(stores::create))
        .route("/add/{id}", post(stores::update))
        .route("/top", get(stores::top))
        .route("/map", get(stores::map))
        .route("/hearts", get(stores::hearts))
}

/// Create the tag routes.
pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tags::index))
        .route("/{tag}", get(tags::show))
}

/// Create the auth and account recovery routes.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route(
            "/account/forgot",
            get(account::forgot_page).post(account::forgot),
        )
        .route(
            "/account/reset/{token}",
            get(account::reset_page).post(account::reset),
        )
}

/// Create the JSON API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(api::search))
        .route("/stores/near", get(api::near))
        .route("/stores/{id}/heart", post(api::toggle_heart))
}

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(store_routes())
        .route("/reviews/{id}", post(reviews::create))
        .nest("/tags", tag_routes())
        .merge(auth_routes())
        .nest("/api", api_routes())
}

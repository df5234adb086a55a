//! Development data seeding.
//!
//! Loads a handful of sample users, stores, and reviews so the pages
//! have something to show. Safe to re-run; existing sample users are
//! reused rather than duplicated.

use secrecy::SecretString;
use sqlx::PgPool;

use storemap_core::Email;
use storemap_web::db::{self, users::UserRepository};
use storemap_web::models::User;
use storemap_web::services::auth::AuthService;
use storemap_web::services::stores::{StoreInput, StoreService};

const SAMPLE_PASSWORD: &str = "sample-password";

struct SampleStore {
    name: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
    address: &'static str,
    longitude: f64,
    latitude: f64,
}

const SAMPLE_STORES: &[SampleStore] = &[
    SampleStore {
        name: "Grandview Diner",
        description: "Classic diner fare with a view over the harbour.",
        tags: &["Family Friendly", "Wifi"],
        address: "289 Water St, St. John's",
        longitude: -52.708_97,
        latitude: 47.561_57,
    },
    SampleStore {
        name: "Night Owl Noodles",
        description: "Hand-pulled noodles until two in the morning.",
        tags: &["Open Late"],
        address: "1033 Granville St, Vancouver",
        longitude: -123.121_77,
        latitude: 49.277_68,
    },
    SampleStore {
        name: "Green Fork",
        description: "Seasonal vegetarian plates and natural wine.",
        tags: &["Vegetarian", "Licensed"],
        address: "781 Queen St W, Toronto",
        longitude: -79.410_43,
        latitude: 43.646_84,
    },
    SampleStore {
        name: "Harbour Coffee",
        description: "Small-batch roaster with plenty of outlets.",
        tags: &["Wifi", "Family Friendly"],
        address: "1701 Lower Water St, Halifax",
        longitude: -63.571_37,
        latitude: 44.642_13,
    },
    SampleStore {
        name: "La Taqueria Perdida",
        description: "Tacos al pastor off the spit, cash only.",
        tags: &["Open Late", "Family Friendly"],
        address: "322 Rue Saint-Paul, Montreal",
        longitude: -73.553_64,
        latitude: 45.506_29,
    },
];

/// Load the sample data set.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset or any database operation
/// fails.
pub async fn run(wipe: bool) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| "DATABASE_URL not set")?;

    let pool = db::create_pool(&database_url).await?;
    tracing::info!("Connected to database");

    if wipe {
        tracing::info!("Wiping stores, reviews, and hearts");
        sqlx::query("DELETE FROM reviews").execute(&pool).await?;
        sqlx::query("DELETE FROM user_hearts").execute(&pool).await?;
        sqlx::query("DELETE FROM stores").execute(&pool).await?;
    }

    let alice = ensure_user(&pool, "Alice", "alice@example.com").await?;
    let bob = ensure_user(&pool, "Bob", "bob@example.com").await?;

    let stores = StoreService::new(&pool);
    let mut created = 0usize;

    for (i, sample) in SAMPLE_STORES.iter().enumerate() {
        let author = if i % 2 == 0 { &alice } else { &bob };
        let reviewer = if i % 2 == 0 { &bob } else { &alice };

        let store = stores
            .create(
                author.id,
                StoreInput {
                    name: sample.name.to_owned(),
                    description: Some(sample.description.to_owned()),
                    tags: sample.tags.iter().map(|&t| t.to_owned()).collect(),
                    longitude: sample.longitude,
                    latitude: sample.latitude,
                    address: sample.address.to_owned(),
                    photo: None,
                },
            )
            .await?;

        // Two reviews each so the store qualifies for the top list
        stores
            .add_review(reviewer.id, store.id, "Really enjoyed this place.", 4)
            .await?;
        stores
            .add_review(author.id, store.id, "A regular haunt of mine.", 5)
            .await?;

        created += 1;
    }

    tracing::info!(stores = created, "Seeding complete!");
    Ok(())
}

/// Find or create a sample user.
async fn ensure_user(
    pool: &PgPool,
    name: &str,
    email: &str,
) -> Result<User, Box<dyn std::error::Error>> {
    let users = UserRepository::new(pool);
    let parsed = Email::parse(email)?;

    if let Some(user) = users.get_by_email(&parsed).await? {
        tracing::info!(email, "Sample user already exists");
        return Ok(user);
    }

    let auth = AuthService::new(pool);
    let user = auth
        .register(name, email, SAMPLE_PASSWORD, SAMPLE_PASSWORD)
        .await?;
    tracing::info!(email, "Sample user created");

    Ok(user)
}

//! Business logic services.

pub mod auth;
pub mod email;
pub mod media;
pub mod recovery;
pub mod stores;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, Mailer};
pub use media::{MediaError, MediaProcessor};
pub use recovery::{AccountRecovery, RecoveryError};
pub use stores::{StoreError, StoreInput, StoreService};

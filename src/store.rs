//! Errors shared by the persistence traits.

use rejuvenators_models::InvalidStatus;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row holds a value the domain types cannot represent.
    #[error("Corrupt row: {0}")]
    Corrupt(#[from] InvalidStatus),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

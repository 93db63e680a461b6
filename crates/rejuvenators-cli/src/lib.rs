//! # Rejuvenators CLI
//!
//! Development utilities for the admin API: database seeding, plus
//! read-only views of the permission matrix and resource catalog.
//!
//! ```ignore
//! use rejuvenators_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::default().with_bookings(200);
//! seed_all(&pool, config).await?;
//! ```

pub mod seeder;

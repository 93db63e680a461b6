//! Fake data for local development.
//!
//! Rows are generated in parallel with Rayon as regular domain models (ids
//! included), then inserted in batches inside one transaction per table.

mod bookings;
mod catalog;
mod people;

use sqlx::PgPool;
use std::time::Instant;

pub use bookings::{generate_bookings, seed_bookings};
pub use catalog::{SERVICE_MENU, generate_services, seed_services};
pub use people::{generate_customers, generate_therapists, seed_customers, seed_therapists};

pub type SeedResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Rows inserted per multi-value INSERT.
pub(crate) const BATCH_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub customers: usize,
    pub therapists: usize,
    pub bookings: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            customers: 50,
            therapists: 8,
            bookings: 150,
        }
    }
}

impl SeedConfig {
    pub fn with_customers(mut self, customers: usize) -> Self {
        self.customers = customers;
        self
    }

    pub fn with_therapists(mut self, therapists: usize) -> Self {
        self.therapists = therapists;
        self
    }

    pub fn with_bookings(mut self, bookings: usize) -> Self {
        self.bookings = bookings;
        self
    }
}

/// Seeds the whole service menu, then people, then bookings between them.
pub async fn seed_all(db: &PgPool, config: SeedConfig) -> SeedResult<()> {
    let start_time = Instant::now();
    println!("🌱 Seeding console data...");

    let services = seed_services(db).await?;
    let customers = seed_customers(db, config.customers).await?;
    let therapists = seed_therapists(db, config.therapists).await?;

    if customers.is_empty() || therapists.is_empty() {
        println!("   ⚠ No customers or therapists; skipping bookings");
    } else {
        seed_bookings(db, config.bookings, &customers, &therapists, &services).await?;
    }

    println!("✅ Seeding finished in {:?}", start_time.elapsed());
    Ok(())
}

/// Deletes every console row, children first.
pub async fn clear_all(db: &PgPool) -> SeedResult<()> {
    let start_time = Instant::now();
    println!("🗑️  Clearing console data...");

    let mut tx = db.begin().await?;
    for table in [
        "bookings",
        "therapist_services",
        "therapist_availability",
        "therapist_profiles",
        "services",
        "customers",
    ] {
        let deleted = sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        println!("   ✓ {}: {} rows", table, deleted);
    }
    tx.commit().await?;

    println!("✅ Cleared in {:?}", start_time.elapsed());
    Ok(())
}

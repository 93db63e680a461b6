//! The service menu.

use rejuvenators_models::{Service, ServiceId};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;

use super::SeedResult;

/// `(name, duration in minutes, price in cents)`
pub const SERVICE_MENU: &[(&str, i32, i64)] = &[
    ("Swedish Massage", 60, 12_000),
    ("Deep Tissue Massage", 60, 14_000),
    ("Deep Tissue Massage", 90, 19_000),
    ("Hot Stone Massage", 75, 16_500),
    ("Sports Massage", 60, 14_500),
    ("Pregnancy Massage", 60, 13_000),
    ("Couples Massage", 90, 32_000),
    ("Reflexology", 45, 9_000),
];

pub fn generate_services() -> Vec<Service> {
    SERVICE_MENU
        .iter()
        .map(|(name, duration_minutes, price_cents)| Service {
            id: ServiceId::new(),
            name: format!("{} ({} min)", name, duration_minutes),
            duration_minutes: *duration_minutes,
            price_cents: *price_cents,
            is_active: true,
        })
        .collect()
}

pub async fn seed_services(db: &PgPool) -> SeedResult<Vec<Service>> {
    let start_time = Instant::now();
    println!("💆 Seeding {} services...", SERVICE_MENU.len());

    let services = generate_services();
    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO services (id, name, duration_minutes, price_cents, is_active) ",
    );
    builder.push_values(&services, |mut row, service| {
        row.push_bind(service.id)
            .push_bind(&service.name)
            .push_bind(service.duration_minutes)
            .push_bind(service.price_cents)
            .push_bind(service.is_active);
    });
    builder.build().execute(db).await?;

    println!(
        "   ✓ Inserted {} services in {:?}",
        services.len(),
        start_time.elapsed()
    );
    Ok(services)
}

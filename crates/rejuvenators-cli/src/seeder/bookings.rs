//! Bookings spread over the past and coming weeks.

use chrono::{DateTime, Duration, DurationRound, Utc};
use fake::Fake;
use fake::faker::address::en::{CityName, StreetName};
use rayon::prelude::*;
use rejuvenators_models::{
    Booking, BookingId, BookingStatus, Customer, PaymentStatus, Service, TherapistProfile,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;

use super::{BATCH_SIZE, SeedResult};

/// Bookings land within this many days either side of today.
const WINDOW_DAYS: i64 = 30;

fn pick<T>(items: &[T]) -> &T {
    &items[(0..items.len()).fake::<usize>()]
}

/// Past bookings lean towards finished statuses, future ones towards open.
fn status_for(booking_time: DateTime<Utc>, now: DateTime<Utc>) -> (BookingStatus, PaymentStatus) {
    const PAST: &[BookingStatus] = &[
        BookingStatus::Completed,
        BookingStatus::Completed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Declined,
    ];
    const UPCOMING: &[BookingStatus] = &[
        BookingStatus::Requested,
        BookingStatus::Confirmed,
        BookingStatus::Confirmed,
        BookingStatus::TimeoutReassigned,
        BookingStatus::SeekingAlternate,
    ];

    if booking_time < now {
        let status = *pick(PAST);
        let payment = match status {
            BookingStatus::Completed => PaymentStatus::Paid,
            _ => *pick(&[PaymentStatus::Pending, PaymentStatus::Refunded]),
        };
        (status, payment)
    } else {
        (*pick(UPCOMING), PaymentStatus::Pending)
    }
}

pub fn generate_bookings(
    count: usize,
    customers: &[Customer],
    therapists: &[TherapistProfile],
    services: &[Service],
) -> Vec<Booking> {
    if customers.is_empty() || therapists.is_empty() || services.is_empty() {
        return Vec::new();
    }

    let now = Utc::now();
    let today = now
        .duration_trunc(Duration::hours(1))
        .unwrap_or(now);

    (0..count)
        .into_par_iter()
        .map(|_| {
            let service = pick(services);
            let offset_hours = (-WINDOW_DAYS * 24..WINDOW_DAYS * 24).fake::<i64>();
            let booking_time = today + Duration::hours(offset_hours);
            let (status, payment_status) = status_for(booking_time, now);
            let street: String = StreetName().fake();
            let city: String = CityName().fake();

            Booking {
                id: BookingId::new(),
                customer_id: pick(customers).id,
                therapist_id: pick(therapists).id,
                service_id: service.id,
                booking_time,
                status,
                payment_status,
                price_cents: service.price_cents,
                // Therapists take 60% of the service price.
                therapist_fee_cents: service.price_cents * 6 / 10,
                address: format!("{} {}, {}", (1..400).fake::<u32>(), street, city),
                notes: None,
                created_at: now,
                updated_at: now,
            }
        })
        .collect()
}

pub async fn seed_bookings(
    db: &PgPool,
    count: usize,
    customers: &[Customer],
    therapists: &[TherapistProfile],
    services: &[Service],
) -> SeedResult<Vec<BookingId>> {
    let start_time = Instant::now();
    println!("📅 Seeding {} bookings...", count);

    let bookings = generate_bookings(count, customers, therapists, services);
    let mut tx = db.begin().await?;
    for chunk in bookings.chunks(BATCH_SIZE) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO bookings (id, customer_id, therapist_id, service_id, booking_time, \
             status, payment_status, price_cents, therapist_fee_cents, address) ",
        );
        builder.push_values(chunk, |mut row, booking| {
            row.push_bind(booking.id)
                .push_bind(booking.customer_id)
                .push_bind(booking.therapist_id)
                .push_bind(booking.service_id)
                .push_bind(booking.booking_time)
                .push_bind(booking.status.as_str())
                .push_bind(booking.payment_status.as_str())
                .push_bind(booking.price_cents)
                .push_bind(booking.therapist_fee_cents)
                .push_bind(&booking.address);
        });
        builder.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} bookings in {:?}",
        bookings.len(),
        start_time.elapsed()
    );
    Ok(bookings.iter().map(|b| b.id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeder::{generate_customers, generate_services, generate_therapists};

    #[test]
    fn test_bookings_reference_seeded_rows() {
        let customers = generate_customers(10);
        let therapists = generate_therapists(3);
        let services = generate_services();

        let bookings = generate_bookings(100, &customers, &therapists, &services);
        assert_eq!(bookings.len(), 100);
        for booking in &bookings {
            assert!(customers.iter().any(|c| c.id == booking.customer_id));
            assert!(therapists.iter().any(|t| t.id == booking.therapist_id));
            let service = services.iter().find(|s| s.id == booking.service_id).unwrap();
            assert_eq!(booking.price_cents, service.price_cents);
        }
    }

    #[test]
    fn test_past_bookings_are_not_open() {
        let now = Utc::now();
        for _ in 0..50 {
            let (status, payment) = status_for(now - Duration::days(2), now);
            assert!(status.is_terminal());
            if status == BookingStatus::Completed {
                assert_eq!(payment, PaymentStatus::Paid);
            }
        }
        let (status, payment) = status_for(now + Duration::days(2), now);
        assert!(!status.is_terminal());
        assert_eq!(payment, PaymentStatus::Pending);
    }

    #[test]
    fn test_no_bookings_without_people() {
        assert!(generate_bookings(10, &[], &generate_therapists(1), &generate_services()).is_empty());
    }
}

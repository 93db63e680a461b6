//! Customers and therapist profiles.

use chrono::Utc;
use fake::Fake;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rayon::prelude::*;
use rejuvenators_models::{Customer, CustomerId, TherapistId, TherapistProfile};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;
use uuid::Uuid;

use super::{BATCH_SIZE, SeedResult};

/// Emails are unique per table, so every address carries a random suffix.
fn unique_email(first_name: &str, last_name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}.{}.{}@example.com",
        first_name.to_lowercase(),
        last_name.to_lowercase(),
        &suffix[..8]
    )
}

pub fn generate_customers(count: usize) -> Vec<Customer> {
    (0..count)
        .into_par_iter()
        .map(|_| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            Customer {
                id: CustomerId::new(),
                email: unique_email(&first_name, &last_name),
                phone: Some(PhoneNumber().fake()),
                first_name,
                last_name,
            }
        })
        .collect()
}

pub fn generate_therapists(count: usize) -> Vec<TherapistProfile> {
    let now = Utc::now();
    (0..count)
        .into_par_iter()
        .map(|_| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            TherapistProfile {
                id: TherapistId::new(),
                user_id: None,
                email: unique_email(&first_name, &last_name),
                phone: Some(PhoneNumber().fake()),
                bio: Some(Sentence(8..16).fake()),
                profile_pic: None,
                is_active: true,
                first_name,
                last_name,
                created_at: now,
                updated_at: now,
            }
        })
        .collect()
}

pub async fn seed_customers(db: &PgPool, count: usize) -> SeedResult<Vec<Customer>> {
    let start_time = Instant::now();
    println!("🧍 Seeding {} customers...", count);

    let customers = generate_customers(count);
    let mut tx = db.begin().await?;
    for chunk in customers.chunks(BATCH_SIZE) {
        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO customers (id, first_name, last_name, email, phone) ");
        builder.push_values(chunk, |mut row, customer| {
            row.push_bind(customer.id)
                .push_bind(&customer.first_name)
                .push_bind(&customer.last_name)
                .push_bind(&customer.email)
                .push_bind(&customer.phone);
        });
        builder.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} customers in {:?}",
        customers.len(),
        start_time.elapsed()
    );
    Ok(customers)
}

pub async fn seed_therapists(db: &PgPool, count: usize) -> SeedResult<Vec<TherapistProfile>> {
    let start_time = Instant::now();
    println!("👐 Seeding {} therapists...", count);

    let therapists = generate_therapists(count);
    let mut tx = db.begin().await?;
    for chunk in therapists.chunks(BATCH_SIZE) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO therapist_profiles (id, first_name, last_name, email, phone, bio, is_active) ",
        );
        builder.push_values(chunk, |mut row, therapist| {
            row.push_bind(therapist.id)
                .push_bind(&therapist.first_name)
                .push_bind(&therapist.last_name)
                .push_bind(&therapist.email)
                .push_bind(&therapist.phone)
                .push_bind(&therapist.bio)
                .push_bind(therapist.is_active);
        });
        builder.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} therapists in {:?}",
        therapists.len(),
        start_time.elapsed()
    );
    Ok(therapists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_emails_are_unique() {
        let customers = generate_customers(200);
        let emails: HashSet<_> = customers.iter().map(|c| c.email.as_str()).collect();
        assert_eq!(emails.len(), 200);
        assert!(customers.iter().all(|c| c.email.ends_with("@example.com")));
    }

    #[test]
    fn test_generated_therapists_are_active_without_photos() {
        let therapists = generate_therapists(5);
        assert_eq!(therapists.len(), 5);
        assert!(therapists.iter().all(|t| t.is_active && t.profile_pic.is_none()));
    }
}

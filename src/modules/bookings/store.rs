//! Booking persistence.
//!
//! [`PgBookingStore`] is the production backend. [`InMemoryBookingStore`]
//! keeps everything in process memory for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tokio::sync::RwLock;
use tracing::instrument;

use rejuvenators_models::bookings::{BookingListRow, BookingRow};
use rejuvenators_models::{
    Booking, BookingId, BookingListItem, BookingQuery, BookingStatus, Customer, CustomerId,
    PaymentStatus, Service, ServiceId, TherapistId,
};

use crate::store::StoreError;

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: &Booking) -> Result<Booking, StoreError>;

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError>;

    /// One page of matches, newest first, plus the total match count.
    async fn list(&self, query: &BookingQuery) -> Result<(Vec<BookingListItem>, i64), StoreError>;

    /// Writes every detail field of `booking`. Status fields are left alone.
    async fn update_details(&self, booking: &Booking) -> Result<Option<Booking>, StoreError>;

    /// Sets `status` only if the stored status is still `expected`.
    /// `None` means the booking is gone or was changed underneath us.
    async fn update_status_if(
        &self,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Option<Booking>, StoreError>;

    async fn update_payment_status(
        &self,
        id: BookingId,
        next: PaymentStatus,
    ) -> Result<Option<Booking>, StoreError>;

    /// Returns `false` if nothing was deleted.
    async fn delete(&self, id: BookingId) -> Result<bool, StoreError>;
}

const BOOKING_COLUMNS: &str = "b.id, b.customer_id, b.therapist_id, b.service_id, b.booking_time, \
     b.status, b.payment_status, b.price_cents, b.therapist_fee_cents, b.address, b.notes, \
     b.created_at, b.updated_at";

const RETURNING: &str = "RETURNING id, customer_id, therapist_id, service_id, booking_time, \
     status, payment_status, price_cents, therapist_fee_cents, address, notes, created_at, updated_at";

/// Escapes `LIKE` wildcards so search text matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub struct PgBookingStore {
    db: PgPool,
}

impl PgBookingStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BookingQuery) {
        builder.push(" WHERE 1=1");

        if let Some(status) = query.status {
            builder.push(" AND b.status = ").push_bind(status.as_str());
        }
        if let Some(payment_status) = query.payment_status {
            builder
                .push(" AND b.payment_status = ")
                .push_bind(payment_status.as_str());
        }
        if let Some(therapist_id) = query.therapist_id {
            builder
                .push(" AND b.therapist_id = ")
                .push_bind(therapist_id.into_inner());
        }
        if let Some(service_id) = query.service_id {
            builder
                .push(" AND b.service_id = ")
                .push_bind(service_id.into_inner());
        }
        if let Some(from) = query.from {
            builder.push(" AND b.booking_time >= ").push_bind(from);
        }
        if let Some(until) = query.until {
            builder.push(" AND b.booking_time < ").push_bind(until);
        }
        if let Some(search) = &query.search {
            let pattern = like_pattern(search);
            builder.push(" AND (");
            let mut separated = builder.separated(" OR ");
            for column in [
                "c.first_name",
                "c.last_name",
                "(c.first_name || ' ' || c.last_name)",
                "c.email",
                "c.phone",
                "t.first_name",
                "t.last_name",
                "(t.first_name || ' ' || t.last_name)",
                "s.name",
            ] {
                separated
                    .push(column)
                    .push_unseparated(" ILIKE ")
                    .push_bind_unseparated(pattern.clone());
            }
            builder.push(")");
        }
    }

    const JOINS: &'static str = " FROM bookings b \
         LEFT JOIN customers c ON c.id = b.customer_id \
         LEFT JOIN therapist_profiles t ON t.id = b.therapist_id \
         LEFT JOIN services s ON s.id = b.service_id";
}

#[async_trait]
impl BookingStore for PgBookingStore {
    #[instrument(skip(self, booking), fields(booking_id = %booking.id))]
    async fn insert(&self, booking: &Booking) -> Result<Booking, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            INSERT INTO bookings (id, customer_id, therapist_id, service_id, booking_time,
                status, payment_status, price_cents, therapist_fee_cents, address, notes,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            {}
            "#,
            RETURNING
        ))
        .bind(booking.id.into_inner())
        .bind(booking.customer_id.into_inner())
        .bind(booking.therapist_id.into_inner())
        .bind(booking.service_id.into_inner())
        .bind(booking.booking_time)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.price_cents)
        .bind(booking.therapist_fee_cents)
        .bind(&booking.address)
        .bind(&booking.notes)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .fetch_one(&self.db)
        .await?;

        Ok(row.try_into()?)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings b WHERE b.id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Booking::try_from).transpose()?)
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &BookingQuery) -> Result<(Vec<BookingListItem>, i64), StoreError> {
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count_builder.push(Self::JOINS);
        Self::push_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {}, \
             NULLIF(TRIM(COALESCE(c.first_name, '') || ' ' || COALESCE(c.last_name, '')), '') AS customer_name, \
             NULLIF(TRIM(COALESCE(t.first_name, '') || ' ' || COALESCE(t.last_name, '')), '') AS therapist_name, \
             s.name AS service_name",
            BOOKING_COLUMNS
        ));
        builder.push(Self::JOINS);
        Self::push_filters(&mut builder, query);
        builder
            .push(" ORDER BY b.booking_time DESC, b.id DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        let rows = builder
            .build_query_as::<BookingListRow>()
            .fetch_all(&self.db)
            .await?;

        let items = rows
            .into_iter()
            .map(BookingListItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total))
    }

    #[instrument(skip(self, booking), fields(booking_id = %booking.id))]
    async fn update_details(&self, booking: &Booking) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET customer_id = $1, therapist_id = $2, service_id = $3, booking_time = $4,
                price_cents = $5, therapist_fee_cents = $6, address = $7, notes = $8,
                updated_at = NOW()
            WHERE id = $9
            {}
            "#,
            RETURNING
        ))
        .bind(booking.customer_id.into_inner())
        .bind(booking.therapist_id.into_inner())
        .bind(booking.service_id.into_inner())
        .bind(booking.booking_time)
        .bind(booking.price_cents)
        .bind(booking.therapist_fee_cents)
        .bind(&booking.address)
        .bind(&booking.notes)
        .bind(booking.id.into_inner())
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Booking::try_from).transpose()?)
    }

    #[instrument(skip(self))]
    async fn update_status_if(
        &self,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            {}
            "#,
            RETURNING
        ))
        .bind(next.as_str())
        .bind(id.into_inner())
        .bind(expected.as_str())
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Booking::try_from).transpose()?)
    }

    #[instrument(skip(self))]
    async fn update_payment_status(
        &self,
        id: BookingId,
        next: PaymentStatus,
    ) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET payment_status = $1, updated_at = NOW()
            WHERE id = $2
            {}
            "#,
            RETURNING
        ))
        .bind(next.as_str())
        .bind(id.into_inner())
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Booking::try_from).transpose()?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: BookingId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Display names the list view joins in.
#[derive(Debug, Default)]
struct Directory {
    customers: HashMap<CustomerId, Customer>,
    therapists: HashMap<TherapistId, String>,
    services: HashMap<ServiceId, Service>,
}

#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<BookingId, Booking>>,
    directory: RwLock<Directory>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_customer(&self, customer: Customer) {
        self.directory
            .write()
            .await
            .customers
            .insert(customer.id, customer);
    }

    pub async fn add_service(&self, service: Service) {
        self.directory
            .write()
            .await
            .services
            .insert(service.id, service);
    }

    pub async fn add_therapist_name(&self, id: TherapistId, name: impl Into<String>) {
        self.directory
            .write()
            .await
            .therapists
            .insert(id, name.into());
    }

    fn matches(
        query: &BookingQuery,
        item: &BookingListItem,
        customer: Option<&Customer>,
    ) -> bool {
        let booking = &item.booking;
        if query.status.is_some_and(|s| s != booking.status)
            || query.payment_status.is_some_and(|s| s != booking.payment_status)
            || query.therapist_id.is_some_and(|t| t != booking.therapist_id)
            || query.service_id.is_some_and(|s| s != booking.service_id)
            || query.from.is_some_and(|from| booking.booking_time < from)
            || query.until.is_some_and(|until| booking.booking_time >= until)
        {
            return false;
        }

        match &query.search {
            Some(search) => {
                let needle = search.to_lowercase();
                [
                    item.customer_name.as_deref(),
                    customer.map(|c| c.email.as_str()),
                    customer.and_then(|c| c.phone.as_deref()),
                    item.therapist_name.as_deref(),
                    item.service_name.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|name| name.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: &Booking) -> Result<Booking, StoreError> {
        self.bookings.write().await.insert(booking.id, booking.clone());
        Ok(booking.clone())
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list(&self, query: &BookingQuery) -> Result<(Vec<BookingListItem>, i64), StoreError> {
        let bookings = self.bookings.read().await;
        let directory = self.directory.read().await;

        let mut matches: Vec<BookingListItem> = bookings
            .values()
            .filter_map(|b| {
                let customer = directory.customers.get(&b.customer_id);
                let item = BookingListItem::new(
                    b.clone(),
                    customer.map(Customer::full_name),
                    directory.therapists.get(&b.therapist_id).cloned(),
                    directory.services.get(&b.service_id).map(|s| s.name.clone()),
                );
                Self::matches(query, &item, customer).then_some(item)
            })
            .collect();

        // Newest first; id breaks ties so pages never overlap.
        matches.sort_by(|a, b| {
            (b.booking.booking_time, b.booking.id).cmp(&(a.booking.booking_time, a.booking.id))
        });

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn update_details(&self, booking: &Booking) -> Result<Option<Booking>, StoreError> {
        let mut bookings = self.bookings.write().await;
        let Some(stored) = bookings.get_mut(&booking.id) else {
            return Ok(None);
        };

        let (status, payment_status) = (stored.status, stored.payment_status);
        *stored = Booking {
            status,
            payment_status,
            updated_at: Utc::now(),
            ..booking.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn update_status_if(
        &self,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Option<Booking>, StoreError> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&id) {
            Some(stored) if stored.status == expected => {
                stored.status = next;
                stored.updated_at = Utc::now();
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_payment_status(
        &self,
        id: BookingId,
        next: PaymentStatus,
    ) -> Result<Option<Booking>, StoreError> {
        let mut bookings = self.bookings.write().await;
        Ok(bookings.get_mut(&id).map(|stored| {
            stored.payment_status = next;
            stored.updated_at = Utc::now();
            stored.clone()
        }))
    }

    async fn delete(&self, id: BookingId) -> Result<bool, StoreError> {
        Ok(self.bookings.write().await.remove(&id).is_some())
    }
}

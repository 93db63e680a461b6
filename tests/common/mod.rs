#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use rejuvenators::authz::IdentityResolver;
use rejuvenators::modules::bookings::store::{BookingStore, InMemoryBookingStore};
use rejuvenators::modules::therapists::store::InMemoryTherapistStore;
use rejuvenators::router::init_router;
use rejuvenators::state::AppState;
use rejuvenators::store::StoreError;
use rejuvenators_auth::create_access_token;
use rejuvenators_config::{JwtConfig, StorageConfig, StoreBackend};
use rejuvenators_core::Role;
use rejuvenators_models::{
    Booking, BookingId, BookingListItem, BookingQuery, BookingStatus, CustomerId, PaymentStatus,
    ServiceId, TherapistId, TherapistProfile,
};

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        access_token_expiry: 3600,
    }
}

pub fn storage_config() -> StorageConfig {
    StorageConfig {
        backend: StoreBackend::Memory,
        upload_dir: std::env::temp_dir().join(format!("rejuvenators-test-{}", Uuid::new_v4())),
        public_files_url: "http://files.test".to_string(),
        photo_bucket: "therapist-photos".to_string(),
        max_upload_bytes: 1024,
    }
}

pub fn token(role: Option<Role>, therapist_id: Option<TherapistId>) -> String {
    create_access_token(
        Uuid::new_v4(),
        "someone@rejuvenators.test",
        role,
        therapist_id.map(TherapistId::into_inner),
        &jwt_config(),
    )
    .unwrap()
}

pub struct TestApp {
    pub state: AppState,
    pub bookings: Arc<InMemoryBookingStore>,
    pub therapists: Arc<InMemoryTherapistStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let bookings = Arc::new(InMemoryBookingStore::new());
        let therapists = Arc::new(InMemoryTherapistStore::new());
        let state = AppState::new(
            bookings.clone(),
            therapists.clone(),
            IdentityResolver::ready(jwt_config()),
            storage_config(),
        );
        Self {
            state,
            bookings,
            therapists,
        }
    }

    /// Routes booking writes through a store that fails for `failing` ids.
    pub fn with_failing_bookings(mut self, failing: &[BookingId]) -> Self {
        self.state.bookings = Arc::new(FlakyBookingStore {
            inner: self.bookings.clone(),
            failing: failing.iter().copied().collect(),
        });
        self
    }

    pub fn router(&self) -> axum::Router {
        init_router(self.state.clone())
    }

    pub async fn seed_booking(&self, therapist_id: TherapistId, status: BookingStatus) -> Booking {
        let now = Utc::now();
        self.bookings
            .insert(&Booking {
                id: BookingId::new(),
                customer_id: CustomerId::new(),
                therapist_id,
                service_id: ServiceId::new(),
                booking_time: now + Duration::days(1),
                status,
                payment_status: PaymentStatus::Pending,
                price_cents: 12_000,
                therapist_fee_cents: 8_000,
                address: "12 Ocean Ave".to_string(),
                notes: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    pub async fn seed_therapist(&self, first_name: &str) -> TherapistProfile {
        let now = Utc::now();
        let profile = TherapistProfile {
            id: TherapistId::new(),
            user_id: None,
            first_name: first_name.to_string(),
            last_name: "Therapist".to_string(),
            email: format!("{}@rejuvenators.test", first_name.to_lowercase()),
            phone: None,
            bio: None,
            profile_pic: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.therapists.insert(profile.clone()).await;
        profile
    }

    pub async fn status_of(&self, id: BookingId) -> Option<BookingStatus> {
        self.bookings.get(id).await.unwrap().map(|b| b.status)
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Wraps the in-memory store and fails every write to selected ids.
pub struct FlakyBookingStore {
    inner: Arc<InMemoryBookingStore>,
    failing: HashSet<BookingId>,
}

impl FlakyBookingStore {
    fn check(&self, id: BookingId) -> Result<(), StoreError> {
        if self.failing.contains(&id) {
            return Err(StoreError::Unavailable(format!("injected failure for {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for FlakyBookingStore {
    async fn insert(&self, booking: &Booking) -> Result<Booking, StoreError> {
        self.inner.insert(booking).await
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        self.inner.get(id).await
    }

    async fn list(&self, query: &BookingQuery) -> Result<(Vec<BookingListItem>, i64), StoreError> {
        self.inner.list(query).await
    }

    async fn update_details(&self, booking: &Booking) -> Result<Option<Booking>, StoreError> {
        self.check(booking.id)?;
        self.inner.update_details(booking).await
    }

    async fn update_status_if(
        &self,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Option<Booking>, StoreError> {
        self.check(id)?;
        self.inner.update_status_if(id, expected, next).await
    }

    async fn update_payment_status(
        &self,
        id: BookingId,
        next: PaymentStatus,
    ) -> Result<Option<Booking>, StoreError> {
        self.check(id)?;
        self.inner.update_payment_status(id, next).await
    }

    async fn delete(&self, id: BookingId) -> Result<bool, StoreError> {
        self.check(id)?;
        self.inner.delete(id).await
    }
}

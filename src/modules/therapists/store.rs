use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::instrument;

use rejuvenators_models::{TherapistId, TherapistProfile};

use crate::store::StoreError;

#[async_trait]
pub trait TherapistStore: Send + Sync {
    /// All profiles ordered by name.
    async fn list(&self) -> Result<Vec<TherapistProfile>, StoreError>;

    async fn get(&self, id: TherapistId) -> Result<Option<TherapistProfile>, StoreError>;

    /// Writes the editable fields of `profile`.
    async fn update(&self, profile: &TherapistProfile) -> Result<Option<TherapistProfile>, StoreError>;

    async fn set_photo(
        &self,
        id: TherapistId,
        url: &str,
    ) -> Result<Option<TherapistProfile>, StoreError>;
}

const COLUMNS: &str = "id, user_id, first_name, last_name, email, phone, bio, profile_pic, \
     is_active, created_at, updated_at";

pub struct PgTherapistStore {
    db: PgPool,
}

impl PgTherapistStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TherapistStore for PgTherapistStore {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<TherapistProfile>, StoreError> {
        let profiles = sqlx::query_as::<_, TherapistProfile>(&format!(
            "SELECT {} FROM therapist_profiles ORDER BY first_name, last_name",
            COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(profiles)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: TherapistId) -> Result<Option<TherapistProfile>, StoreError> {
        let profile = sqlx::query_as::<_, TherapistProfile>(&format!(
            "SELECT {} FROM therapist_profiles WHERE id = $1",
            COLUMNS
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.db)
        .await?;

        Ok(profile)
    }

    #[instrument(skip(self, profile), fields(therapist_id = %profile.id))]
    async fn update(&self, profile: &TherapistProfile) -> Result<Option<TherapistProfile>, StoreError> {
        let updated = sqlx::query_as::<_, TherapistProfile>(&format!(
            r#"
            UPDATE therapist_profiles
            SET first_name = $1, last_name = $2, phone = $3, bio = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.bio)
        .bind(profile.id.into_inner())
        .fetch_optional(&self.db)
        .await?;

        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn set_photo(
        &self,
        id: TherapistId,
        url: &str,
    ) -> Result<Option<TherapistProfile>, StoreError> {
        let updated = sqlx::query_as::<_, TherapistProfile>(&format!(
            r#"
            UPDATE therapist_profiles
            SET profile_pic = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(url)
        .bind(id.into_inner())
        .fetch_optional(&self.db)
        .await?;

        Ok(updated)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTherapistStore {
    profiles: RwLock<HashMap<TherapistId, TherapistProfile>>,
}

impl InMemoryTherapistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: TherapistProfile) {
        self.profiles.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl TherapistStore for InMemoryTherapistStore {
    async fn list(&self) -> Result<Vec<TherapistProfile>, StoreError> {
        let mut profiles: Vec<_> = self.profiles.read().await.values().cloned().collect();
        profiles.sort_by(|a, b| {
            (&a.first_name, &a.last_name).cmp(&(&b.first_name, &b.last_name))
        });
        Ok(profiles)
    }

    async fn get(&self, id: TherapistId) -> Result<Option<TherapistProfile>, StoreError> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn update(&self, profile: &TherapistProfile) -> Result<Option<TherapistProfile>, StoreError> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles.get_mut(&profile.id).map(|stored| {
            stored.first_name = profile.first_name.clone();
            stored.last_name = profile.last_name.clone();
            stored.phone = profile.phone.clone();
            stored.bio = profile.bio.clone();
            stored.updated_at = Utc::now();
            stored.clone()
        }))
    }

    async fn set_photo(
        &self,
        id: TherapistId,
        url: &str,
    ) -> Result<Option<TherapistProfile>, StoreError> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles.get_mut(&id).map(|stored| {
            stored.profile_pic = Some(url.to_string());
            stored.updated_at = Utc::now();
            stored.clone()
        }))
    }
}

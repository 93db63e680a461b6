use anyhow::anyhow;
use tracing::instrument;
use uuid::Uuid;

use rejuvenators_core::AppError;
use rejuvenators_core::file_storage::{StorageError, image_extension};
use rejuvenators_models::{
    Identity, TherapistId, TherapistProfile, TherapistProfileView, UpdateTherapistProfileDto,
};
use rejuvenators_models::therapists::TherapistListResponse;

use crate::state::AppState;
use crate::store::StoreError;

fn store_error(err: StoreError) -> AppError {
    tracing::error!(error = %err, "Therapist store failure");
    AppError::database(err)
}

fn storage_error(err: StorageError) -> AppError {
    match err {
        StorageError::InvalidFileSize { .. } => {
            AppError::new(axum::http::StatusCode::PAYLOAD_TOO_LARGE, err)
        }
        StorageError::InvalidMimeType { .. } => {
            AppError::new(axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE, err)
        }
        StorageError::InvalidKey(_) => AppError::bad_request(err),
        StorageError::Io(_) => {
            tracing::error!(error = %err, "File storage failure");
            AppError::internal(err)
        }
    }
}

pub struct TherapistService;

impl TherapistService {
    #[instrument(skip(state))]
    pub async fn list_therapists(state: &AppState) -> Result<TherapistListResponse, AppError> {
        let profiles = state.therapists.list().await.map_err(store_error)?;
        Ok(TherapistListResponse {
            data: profiles.into_iter().map(TherapistProfileView::from).collect(),
        })
    }

    #[instrument(skip(state))]
    pub async fn get_therapist(
        state: &AppState,
        id: TherapistId,
    ) -> Result<TherapistProfileView, AppError> {
        let profile = state
            .therapists
            .get(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| AppError::not_found(anyhow!("Therapist not found")))?;

        Ok(profile.into())
    }

    /// The profile linked to the caller's account.
    async fn own_profile(state: &AppState, identity: &Identity) -> Result<TherapistProfile, AppError> {
        let id = identity.therapist_id.ok_or_else(|| {
            AppError::not_found(anyhow!("No therapist profile is linked to this account"))
        })?;

        state
            .therapists
            .get(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| AppError::not_found(anyhow!("Therapist profile not found")))
    }

    #[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
    pub async fn get_my_profile(
        state: &AppState,
        identity: &Identity,
    ) -> Result<TherapistProfileView, AppError> {
        Ok(Self::own_profile(state, identity).await?.into())
    }

    #[instrument(skip(state, identity, dto), fields(user_id = %identity.user_id))]
    pub async fn update_my_profile(
        state: &AppState,
        identity: &Identity,
        dto: UpdateTherapistProfileDto,
    ) -> Result<TherapistProfileView, AppError> {
        let mut profile = Self::own_profile(state, identity).await?;
        dto.apply_to(&mut profile);

        let updated = state
            .therapists
            .update(&profile)
            .await
            .map_err(store_error)?
            .ok_or_else(|| AppError::not_found(anyhow!("Therapist profile not found")))?;

        tracing::info!(therapist_id = %updated.id, "Therapist profile updated");
        Ok(updated.into())
    }

    /// Stores a new photo under `<therapist id>/<random>.<ext>` in the photo
    /// bucket and points the profile at it. The previous file is removed
    /// once the profile no longer references it.
    #[instrument(skip(state, identity, content), fields(user_id = %identity.user_id, bytes = content.len()))]
    pub async fn upload_my_photo(
        state: &AppState,
        identity: &Identity,
        content_type: &str,
        content: &[u8],
    ) -> Result<TherapistProfileView, AppError> {
        let profile = Self::own_profile(state, identity).await?;
        let extension = image_extension(content_type).map_err(storage_error)?;

        if content.is_empty() {
            return Err(AppError::bad_request(anyhow!("Photo is empty")));
        }
        if content.len() > state.files.max_file_size() {
            return Err(storage_error(StorageError::InvalidFileSize {
                max_bytes: state.files.max_file_size(),
            }));
        }

        let bucket = state.storage_config.photo_bucket.as_str();
        let key = format!("{}/{}.{}", profile.id, Uuid::new_v4(), extension);
        let key = state
            .files
            .save(bucket, &key, content)
            .await
            .map_err(storage_error)?;
        let url = state.files.public_url(bucket, &key).map_err(storage_error)?;

        let updated = state
            .therapists
            .set_photo(profile.id, &url)
            .await
            .map_err(store_error)?
            .ok_or_else(|| AppError::not_found(anyhow!("Therapist profile not found")))?;

        if let Some(previous) = profile.profile_pic.as_deref() {
            Self::remove_previous_photo(state, bucket, previous).await;
        }

        tracing::info!(therapist_id = %updated.id, key = %key, "Therapist photo updated");
        Ok(updated.into())
    }

    /// Failures are logged and otherwise ignored.
    async fn remove_previous_photo(state: &AppState, bucket: &str, previous_url: &str) {
        let Some(old_key) = state.files.key_from_url(bucket, previous_url) else {
            return;
        };
        if let Err(err) = state.files.delete(bucket, old_key).await {
            tracing::warn!(error = %err, key = %old_key, "Failed to remove previous photo");
        }
    }
}

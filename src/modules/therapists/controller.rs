use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, header},
};
use tracing::instrument;

use rejuvenators_core::AppError;
use rejuvenators_models::therapists::TherapistListResponse;
use rejuvenators_models::{TherapistId, TherapistProfileView, UpdateTherapistProfileDto};

use crate::middleware::auth::{RequireOwnTherapistProfile, RequireViewTherapists};
use crate::modules::therapists::service::TherapistService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/therapists",
    responses(
        (status = 200, description = "All therapist profiles", body = TherapistListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires canViewTherapists")
    ),
    tag = "Therapists",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_therapists(
    State(state): State<AppState>,
    RequireViewTherapists(_identity): RequireViewTherapists,
) -> Result<Json<TherapistListResponse>, AppError> {
    let therapists = TherapistService::list_therapists(&state).await?;
    Ok(Json(therapists))
}

#[utoipa::path(
    get,
    path = "/api/therapists/{id}",
    params(
        ("id" = Uuid, Path, description = "Therapist profile ID")
    ),
    responses(
        (status = 200, description = "Therapist profile", body = TherapistProfileView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires canViewTherapists"),
        (status = 404, description = "Therapist not found")
    ),
    tag = "Therapists",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_therapist(
    State(state): State<AppState>,
    RequireViewTherapists(_identity): RequireViewTherapists,
    Path(id): Path<TherapistId>,
) -> Result<Json<TherapistProfileView>, AppError> {
    let therapist = TherapistService::get_therapist(&state, id).await?;
    Ok(Json(therapist))
}

#[utoipa::path(
    get,
    path = "/api/my-profile",
    responses(
        (status = 200, description = "The caller's therapist profile", body = TherapistProfileView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - therapists only"),
        (status = 404, description = "No profile linked to this account")
    ),
    tag = "My Profile",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_profile(
    State(state): State<AppState>,
    RequireOwnTherapistProfile(identity): RequireOwnTherapistProfile,
) -> Result<Json<TherapistProfileView>, AppError> {
    let profile = TherapistService::get_my_profile(&state, &identity).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    put,
    path = "/api/my-profile",
    request_body = UpdateTherapistProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = TherapistProfileView),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - therapists only"),
        (status = 422, description = "Validation failed")
    ),
    tag = "My Profile",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_my_profile(
    State(state): State<AppState>,
    RequireOwnTherapistProfile(identity): RequireOwnTherapistProfile,
    ValidatedJson(dto): ValidatedJson<UpdateTherapistProfileDto>,
) -> Result<Json<TherapistProfileView>, AppError> {
    let profile = TherapistService::update_my_profile(&state, &identity, dto).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    put,
    path = "/api/my-profile/photo",
    request_body(content = Vec<u8>, content_type = "image/jpeg", description = "PNG, JPEG or WebP image"),
    responses(
        (status = 200, description = "Photo stored", body = TherapistProfileView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - therapists only"),
        (status = 413, description = "Photo too large"),
        (status = 415, description = "Unsupported image type")
    ),
    tag = "My Profile",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, headers, body))]
pub async fn upload_my_photo(
    State(state): State<AppState>,
    RequireOwnTherapistProfile(identity): RequireOwnTherapistProfile,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TherapistProfileView>, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim())
        .unwrap_or_default();

    let profile =
        TherapistService::upload_my_photo(&state, &identity, content_type, &body).await?;
    Ok(Json(profile))
}

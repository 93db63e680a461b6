use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, put},
};

use crate::state::AppState;

use super::controller::{
    get_my_profile, get_therapist, get_therapists, update_my_profile, upload_my_photo,
};

pub fn init_therapists_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_therapists))
        .route("/{id}", get(get_therapist))
}

/// Routes for the signed-in therapist's own profile.
pub fn init_my_profile_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(get_my_profile).put(update_my_profile))
        .route(
            "/photo",
            put(upload_my_photo).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

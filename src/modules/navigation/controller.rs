use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use rejuvenators_core::{AppError, ResourceDescriptor, Role, build_catalog};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// The console menu for the caller, in display order.
#[derive(Debug, Serialize, ToSchema)]
pub struct NavigationResponse {
    pub role: Option<Role>,
    pub resources: Vec<ResourceDescriptor>,
}

#[utoipa::path(
    get,
    path = "/api/navigation",
    responses(
        (status = 200, description = "Resources and actions available to the caller", body = NavigationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Identity not resolved yet")
    ),
    tag = "Navigation",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_navigation(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<NavigationResponse>, AppError> {
    // Rebuilt on every request; catalogs are never shared between identities.
    let resources = build_catalog(&state.matrix, identity.role);

    Ok(Json(NavigationResponse {
        role: identity.role,
        resources,
    }))
}

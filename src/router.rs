use axum::http::{HeaderValue, Method};
use axum::{Json, Router, extract::State, middleware, routing::get};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use rejuvenators_observability::{logging_middleware, metrics_middleware};

use crate::docs::ApiDoc;
use crate::modules::bookings::router::init_bookings_router;
use crate::modules::navigation::router::init_navigation_router;
use crate::modules::therapists::router::{init_my_profile_router, init_therapists_router};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether bearer tokens are being resolved yet
    pub identity_ready: bool,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        identity_ready: state.identity.is_ready(),
    })
}

pub fn init_router(state: AppState) -> Router {
    let max_upload_bytes = state.storage_config.max_upload_bytes;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest(
            "/api",
            Router::new()
                .route("/health", get(health_check))
                .nest("/navigation", init_navigation_router())
                .nest("/bookings", init_bookings_router())
                .nest("/therapists", init_therapists_router())
                .nest("/my-profile", init_my_profile_router(max_upload_bytes)),
        )
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

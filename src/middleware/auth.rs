use axum::{extract::FromRequestParts, http::request::Parts};

use rejuvenators_core::catalog::{EDIT_BOOKINGS, OWN_THERAPIST_PROFILE, VIEW_BOOKINGS};
use rejuvenators_core::{AppError, Capability, Requirement};
use rejuvenators_models::Identity;

use crate::authz::{IdentityState, RouteGuard};
use crate::state::AppState;

/// Any resolved identity, with or without a role.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = IdentityState::from_request_parts(parts, state).await?;
        RouteGuard::new(Requirement::Authenticated)
            .render(&state.matrix, &identity, |identity| AuthUser(identity.clone()))
            .into_result()
    }
}

/// Declares an extractor that only succeeds when the caller satisfies
/// `$requirement`. Denials map to 403, a missing identity to 401 and an
/// unsettled identity to 503.
///
/// ```ignore
/// require_capability!(RequireViewReports, Requirement::capability(Capability::ViewReports));
///
/// async fn reports(RequireViewReports(identity): RequireViewReports) { /* ... */ }
/// ```
#[macro_export]
macro_rules! require_capability {
    ($name:ident, $requirement:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub rejuvenators_models::Identity);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = rejuvenators_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                const REQUIREMENT: rejuvenators_core::Requirement = $requirement;

                let identity =
                    <$crate::authz::IdentityState as axum::extract::FromRequestParts<
                        $crate::state::AppState,
                    >>::from_request_parts(parts, state)
                    .await?;

                $crate::authz::RouteGuard::new(REQUIREMENT)
                    .render(&state.matrix, &identity, |identity| $name(identity.clone()))
                    .into_result()
            }
        }
    };
}

// Bookings
require_capability!(RequireViewBookings, VIEW_BOOKINGS);
require_capability!(RequireEditBookings, EDIT_BOOKINGS);
require_capability!(
    RequireCreateBookings,
    Requirement::capability(Capability::CreateBookings)
);
require_capability!(
    RequireDeleteBookings,
    Requirement::capability(Capability::DeleteBookings)
);
require_capability!(
    RequireManagePayments,
    Requirement::capability(Capability::ManagePayments)
);

// Therapists
require_capability!(
    RequireViewTherapists,
    Requirement::capability(Capability::ViewTherapists)
);
require_capability!(RequireOwnTherapistProfile, OWN_THERAPIST_PROFILE);

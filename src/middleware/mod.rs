//! Request extractors for authentication and capability checks.
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. [`IdentityState`](crate::authz::IdentityState) resolves the token
//! 3. A guard extractor declared with [`require_capability!`](crate::require_capability)
//!    checks the route's requirement against the permission matrix
//! 4. The handler runs only when the guard grants access
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequireViewTherapists};
//!
//! // Any signed-in caller
//! async fn navigation(AuthUser(identity): AuthUser) -> impl IntoResponse { /* ... */ }
//!
//! // Guarded by canViewTherapists
//! async fn list_therapists(RequireViewTherapists(identity): RequireViewTherapists) { /* ... */ }
//! ```

pub mod auth;

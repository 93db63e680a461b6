//! Authorization: identity resolution and route guards.

pub mod guard;
pub mod identity_state;

pub use guard::{DenialReason, GuardDecision, Guarded, RouteGuard};
pub use identity_state::{IdentityResolver, IdentityState};

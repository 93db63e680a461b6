//! Route guard.
//!
//! A guard wraps a requirement (or a stack of them) and decides, per
//! identity state, whether the protected view may run. The view is a
//! closure so that a denied or loading request never executes it.

use std::fmt;
use std::future::Future;

use rejuvenators_core::{AppError, PermissionMatrix, Requirement};
use rejuvenators_models::Identity;
use rejuvenators_observability::track_authorization_denied;

use super::identity_state::IdentityState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No identity at all.
    Unauthenticated,
    /// The identity fails this requirement.
    Missing(Requirement),
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::Unauthenticated => f.write_str("Authentication required"),
            DenialReason::Missing(requirement) => {
                write!(f, "Access denied. Missing required capability: {}", requirement)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Identity has not settled. Neither granted nor denied.
    Loading,
    Denied(DenialReason),
    Granted,
}

/// The result of rendering through a guard.
#[derive(Debug)]
pub enum Guarded<T> {
    Loading,
    Denied(DenialReason),
    Granted(T),
}

impl<T> Guarded<T> {
    pub fn granted(self) -> Option<T> {
        match self {
            Guarded::Granted(value) => Some(value),
            _ => None,
        }
    }

    /// Maps the outcome onto HTTP: loading is 503, no identity is 401 and a
    /// failed requirement is 403.
    pub fn into_result(self) -> Result<T, AppError> {
        match self {
            Guarded::Granted(value) => Ok(value),
            Guarded::Loading => Err(AppError::identity_pending()),
            Guarded::Denied(reason @ DenialReason::Unauthenticated) => {
                Err(AppError::unauthorized(reason.to_string()))
            }
            Guarded::Denied(reason @ DenialReason::Missing(_)) => {
                Err(AppError::forbidden(reason.to_string()))
            }
        }
    }
}

/// Requirements checked outermost first. Every one must pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    requirements: Vec<Requirement>,
}

impl RouteGuard {
    pub fn new(requirement: Requirement) -> Self {
        Self {
            requirements: vec![requirement],
        }
    }

    /// Wraps another guard inside this one.
    pub fn nested(mut self, inner: RouteGuard) -> Self {
        self.requirements.extend(inner.requirements);
        self
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn evaluate(&self, matrix: &PermissionMatrix, state: &IdentityState) -> GuardDecision {
        let identity = match state {
            IdentityState::Loading => return GuardDecision::Loading,
            IdentityState::Anonymous => {
                tracing::debug!("Guard denied anonymous caller");
                return GuardDecision::Denied(DenialReason::Unauthenticated);
            }
            IdentityState::Resolved(identity) => identity,
        };

        match self
            .requirements
            .iter()
            .find(|r| !r.is_satisfied(matrix, identity.role))
        {
            Some(unmet) => {
                let role = identity.role.map(|r| r.as_str()).unwrap_or("none");
                tracing::debug!(
                    user_id = %identity.user_id,
                    role = %role,
                    requirement = %unmet,
                    "Guard denied access"
                );
                track_authorization_denied(role, &unmet.to_string());
                GuardDecision::Denied(DenialReason::Missing(*unmet))
            }
            None => GuardDecision::Granted,
        }
    }

    /// Runs `view` only when the guard grants access.
    pub fn render<T, F>(&self, matrix: &PermissionMatrix, state: &IdentityState, view: F) -> Guarded<T>
    where
        F: FnOnce(&Identity) -> T,
    {
        match (self.evaluate(matrix, state), state) {
            (GuardDecision::Granted, IdentityState::Resolved(identity)) => {
                Guarded::Granted(view(identity))
            }
            (GuardDecision::Denied(reason), _) => Guarded::Denied(reason),
            _ => Guarded::Loading,
        }
    }

    pub async fn render_async<T, F, Fut>(
        &self,
        matrix: &PermissionMatrix,
        state: IdentityState,
        view: F,
    ) -> Guarded<T>
    where
        F: FnOnce(Identity) -> Fut,
        Fut: Future<Output = T>,
    {
        match self.evaluate(matrix, &state) {
            GuardDecision::Granted => match state {
                IdentityState::Resolved(identity) => Guarded::Granted(view(identity).await),
                _ => Guarded::Loading,
            },
            GuardDecision::Denied(reason) => Guarded::Denied(reason),
            GuardDecision::Loading => Guarded::Loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rejuvenators_core::catalog::OWN_THERAPIST_PROFILE;
    use rejuvenators_core::{Capability, Role};
    use rejuvenators_models::{TherapistId, UserId};
    use std::cell::Cell;

    fn resolved(role: Option<Role>) -> IdentityState {
        IdentityState::Resolved(Identity {
            user_id: UserId::new(),
            email: "guard@test.com".to_string(),
            role,
            therapist_id: Some(TherapistId::new()),
        })
    }

    fn view_services() -> RouteGuard {
        RouteGuard::new(Requirement::capability(Capability::ViewServices))
    }

    #[test]
    fn test_loading_is_neither_granted_nor_denied() {
        let decision = view_services().evaluate(PermissionMatrix::standard(), &IdentityState::Loading);
        assert_eq!(decision, GuardDecision::Loading);
    }

    #[test]
    fn test_anonymous_and_missing_capability_are_denied() {
        let matrix = PermissionMatrix::standard();
        assert_eq!(
            view_services().evaluate(matrix, &IdentityState::Anonymous),
            GuardDecision::Denied(DenialReason::Unauthenticated)
        );
        assert!(matches!(
            view_services().evaluate(matrix, &resolved(Some(Role::Customer))),
            GuardDecision::Denied(DenialReason::Missing(_))
        ));
        assert!(matches!(
            view_services().evaluate(matrix, &resolved(None)),
            GuardDecision::Denied(DenialReason::Missing(_))
        ));
        assert_eq!(
            view_services().evaluate(matrix, &resolved(Some(Role::Therapist))),
            GuardDecision::Granted
        );
    }

    #[test]
    fn test_view_never_runs_unless_granted() {
        let matrix = PermissionMatrix::standard();
        let calls = Cell::new(0);
        let guard = RouteGuard::new(OWN_THERAPIST_PROFILE);

        for state in [
            IdentityState::Loading,
            IdentityState::Anonymous,
            resolved(Some(Role::Admin)),
            resolved(None),
        ] {
            let out = guard.render(matrix, &state, |_| calls.set(calls.get() + 1));
            assert!(out.granted().is_none());
        }
        assert_eq!(calls.get(), 0);

        let out = guard.render(matrix, &resolved(Some(Role::Therapist)), |identity| {
            calls.set(calls.get() + 1);
            identity.role
        });
        assert_eq!(out.granted(), Some(Some(Role::Therapist)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_nested_guards_all_must_pass() {
        let matrix = PermissionMatrix::standard();
        let guard = RouteGuard::new(Requirement::capability(Capability::ViewDashboard))
            .nested(RouteGuard::new(Requirement::capability(Capability::ViewReports)));
        assert_eq!(guard.requirements().len(), 2);

        assert_eq!(
            guard.evaluate(matrix, &resolved(Some(Role::Admin))),
            GuardDecision::Granted
        );
        assert_eq!(
            guard.evaluate(matrix, &resolved(Some(Role::Therapist))),
            GuardDecision::Denied(DenialReason::Missing(Requirement::capability(
                Capability::ViewReports
            )))
        );
    }

    #[test]
    fn test_into_result_status_codes() {
        let loading: Guarded<()> = Guarded::Loading;
        assert_eq!(loading.into_result().unwrap_err().status.as_u16(), 503);

        let anonymous: Guarded<()> = Guarded::Denied(DenialReason::Unauthenticated);
        assert_eq!(anonymous.into_result().unwrap_err().status.as_u16(), 401);

        let missing: Guarded<()> = Guarded::Denied(DenialReason::Missing(
            Requirement::capability(Capability::ViewReports),
        ));
        let err = missing.into_result().unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
        assert!(err.error.to_string().contains("canViewReports"));
    }

    #[tokio::test]
    async fn test_render_async_skips_view_when_denied() {
        let matrix = PermissionMatrix::standard();
        let guard = view_services();

        let denied: Guarded<()> = guard
            .render_async(matrix, resolved(Some(Role::Customer)), |_| async {
                panic!("view must not run")
            })
            .await;
        assert!(matches!(denied, Guarded::Denied(_)));

        let granted = guard
            .render_async(matrix, resolved(Some(Role::Admin)), |identity| async move {
                identity.email
            })
            .await;
        assert_eq!(granted.granted().as_deref(), Some("guard@test.com"));
    }
}

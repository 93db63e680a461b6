use rejuvenators::authz::{DenialReason, GuardDecision, IdentityState, RouteGuard};
use rejuvenators_core::catalog::{EDIT_BOOKINGS, OWN_THERAPIST_PROFILE, VIEW_BOOKINGS};
use rejuvenators_core::{Capability, PermissionMatrix, Requirement, Role, build_catalog};
use rejuvenators_models::{Identity, TherapistId, UserId};

fn resolved(role: Option<Role>) -> IdentityState {
    IdentityState::Resolved(Identity {
        user_id: UserId::new(),
        email: "test@example.com".to_string(),
        role,
        therapist_id: Some(TherapistId::new()),
    })
}

#[test]
fn test_admin_is_a_subset_of_super_admin() {
    let matrix = PermissionMatrix::standard();
    for capability in Capability::ALL {
        if matrix.can_access(Some(Role::Admin), *capability) {
            assert!(
                matrix.can_access(Some(Role::SuperAdmin), *capability),
                "super_admin lacks {}",
                capability
            );
        }
    }
    assert!(matrix.can_access(Some(Role::SuperAdmin), Capability::OverrideTerminalStatus));
    assert!(!matrix.can_access(Some(Role::Admin), Capability::OverrideTerminalStatus));
}

#[test]
fn test_customer_and_role_less_hold_nothing() {
    let matrix = PermissionMatrix::standard();
    for capability in Capability::ALL {
        assert!(!matrix.can_access(Some(Role::Customer), *capability));
        assert!(!matrix.can_access(None, *capability));
    }
}

#[test]
fn test_named_check_denies_unknown_names() {
    let matrix = PermissionMatrix::standard();
    assert!(matrix.can_access_named(Some(Role::Admin), "canViewAllBookings"));
    assert!(!matrix.can_access_named(Some(Role::SuperAdmin), "canLaunchRockets"));
    assert!(matrix.try_can_access_named(Some(Role::SuperAdmin), "canLaunchRockets").is_err());
}

#[test]
fn test_guard_agrees_with_requirement_for_every_role() {
    let matrix = PermissionMatrix::standard();
    for requirement in [VIEW_BOOKINGS, EDIT_BOOKINGS, OWN_THERAPIST_PROFILE] {
        let guard = RouteGuard::new(requirement);
        for role in Role::ALL.map(Some).into_iter().chain([None]) {
            let expected = requirement.is_satisfied(matrix, role);
            let decision = guard.evaluate(matrix, &resolved(role));
            assert_eq!(decision == GuardDecision::Granted, expected, "{:?} / {}", role, requirement);
        }
    }
}

#[test]
fn test_guard_never_decides_while_loading() {
    let matrix = PermissionMatrix::standard();
    let guard = RouteGuard::new(Requirement::Authenticated);
    assert_eq!(guard.evaluate(matrix, &IdentityState::Loading), GuardDecision::Loading);
    assert_eq!(
        guard.evaluate(matrix, &IdentityState::Anonymous),
        GuardDecision::Denied(DenialReason::Unauthenticated)
    );
}

#[test]
fn test_catalog_visibility_matches_guards() {
    let matrix = PermissionMatrix::standard();
    let names = |role| {
        build_catalog(matrix, role)
            .into_iter()
            .map(|r| r.name)
            .collect::<Vec<_>>()
    };

    assert!(names(Some(Role::Therapist)).contains(&"my-profile"));
    assert!(!names(Some(Role::Admin)).contains(&"my-profile"));
    assert!(names(Some(Role::Admin)).contains(&"therapist_profiles"));
    assert!(!names(Some(Role::Therapist)).contains(&"therapist_profiles"));
    assert!(names(Some(Role::Customer)).is_empty());
    assert!(names(None).is_empty());
}

#[test]
fn test_revoking_a_grant_hides_the_route() {
    let matrix = PermissionMatrix::standard()
        .without_grant(Role::Therapist, Capability::ViewOwnBookings);
    let guard = RouteGuard::new(VIEW_BOOKINGS);
    assert!(matches!(
        guard.evaluate(&matrix, &resolved(Some(Role::Therapist))),
        GuardDecision::Denied(DenialReason::Missing(_))
    ));
    assert!(
        !build_catalog(&matrix, Some(Role::Therapist))
            .iter()
            .any(|r| r.name == "bookings")
    );
}

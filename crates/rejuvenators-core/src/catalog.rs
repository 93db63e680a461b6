//! Resource catalog builder.
//!
//! The console's navigation and route registration come from [`RESOURCES`],
//! a static table evaluated once per identity. [`build_catalog`] is a pure
//! fold over that table: a resource whose visibility requirement fails is
//! dropped, and each action route is kept only if its own requirement holds.
//!
//! The output is never cached between identities. Callers rebuild it whenever
//! the role changes.

use serde::Serialize;
use utoipa::ToSchema;

use crate::permissions::{Capability, PermissionMatrix};
use crate::requirement::Requirement;
use crate::roles::Role;

/// One row of the declarative resource table.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub list: &'static str,
    pub visibility: Requirement,
    pub show: Option<ActionSpec>,
    pub edit: Option<ActionSpec>,
    pub create: Option<ActionSpec>,
    pub delete: Option<Requirement>,
}

/// A route and the requirement gating it.
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub route: &'static str,
    pub requires: Requirement,
}

const fn cap(capability: Capability) -> Requirement {
    Requirement::capability(capability)
}

const fn action(route: &'static str, requires: Requirement) -> Option<ActionSpec> {
    Some(ActionSpec { route, requires })
}

pub const VIEW_BOOKINGS: Requirement = Requirement::AnyOf {
    of: &[
        cap(Capability::ViewAllBookings),
        cap(Capability::ViewOwnBookings),
    ],
};

pub const EDIT_BOOKINGS: Requirement = Requirement::AnyOf {
    of: &[
        cap(Capability::EditAllBookings),
        cap(Capability::EditOwnBookings),
    ],
};

pub const OWN_THERAPIST_PROFILE: Requirement =
    Requirement::capability_for_role(Capability::EditOwnProfile, Role::Therapist);

/// Every navigable resource, in menu order.
pub const RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        name: "dashboard",
        label: "Dashboard",
        icon: "🏠",
        list: "/",
        visibility: cap(Capability::ViewDashboard),
        show: None,
        edit: None,
        create: None,
        delete: None,
    },
    ResourceSpec {
        name: "bookings",
        label: "Bookings",
        icon: "📋",
        list: "/bookings",
        visibility: VIEW_BOOKINGS,
        show: action("/bookings/show/:id", VIEW_BOOKINGS),
        edit: action("/bookings/edit/:id", EDIT_BOOKINGS),
        create: action("/bookings/create", cap(Capability::CreateBookings)),
        delete: Some(cap(Capability::DeleteBookings)),
    },
    ResourceSpec {
        name: "therapist_profiles",
        label: "Therapists",
        icon: "👨‍⚕️",
        list: "/therapists",
        visibility: cap(Capability::ViewTherapists),
        show: action("/therapists/show/:id", cap(Capability::ViewTherapists)),
        edit: action("/therapists/edit/:id", cap(Capability::EditTherapists)),
        create: action("/therapists/create", cap(Capability::CreateTherapists)),
        delete: Some(cap(Capability::DeleteTherapists)),
    },
    ResourceSpec {
        name: "my-profile",
        label: "My Profile",
        icon: "👤",
        list: "/my-profile",
        visibility: OWN_THERAPIST_PROFILE,
        show: None,
        edit: action("/my-profile/edit", OWN_THERAPIST_PROFILE),
        create: None,
        delete: None,
    },
    ResourceSpec {
        name: "customers",
        label: "Customers",
        icon: "👥",
        list: "/customers",
        visibility: cap(Capability::ViewCustomers),
        show: action("/customers/show/:id", cap(Capability::ViewCustomers)),
        edit: action("/customers/edit/:id", cap(Capability::EditCustomers)),
        // Customers sign up through the booking site.
        create: None,
        delete: Some(cap(Capability::DeleteCustomers)),
    },
    ResourceSpec {
        name: "services",
        label: "Services",
        icon: "💆‍♀️",
        list: "/services",
        visibility: cap(Capability::ViewServices),
        show: action("/services/show/:id", cap(Capability::ViewServices)),
        edit: action("/services/edit/:id", cap(Capability::EditServices)),
        create: action("/services/create", cap(Capability::CreateServices)),
        delete: Some(cap(Capability::DeleteServices)),
    },
    ResourceSpec {
        name: "reports",
        label: "Reports",
        icon: "📊",
        list: "/reports",
        visibility: cap(Capability::ViewReports),
        show: None,
        edit: None,
        create: None,
        delete: None,
    },
    ResourceSpec {
        name: "system-settings",
        label: "System Settings",
        icon: "⚙️",
        list: "/system-settings",
        visibility: cap(Capability::AccessSystemSettings),
        show: None,
        edit: None,
        create: None,
        delete: None,
    },
    ResourceSpec {
        name: "user-management",
        label: "User Management",
        icon: "🔐",
        list: "/user-management",
        visibility: cap(Capability::ManageUsers),
        show: None,
        edit: None,
        create: None,
        delete: None,
    },
    ResourceSpec {
        name: "activity-logs",
        label: "Activity Logs",
        icon: "📜",
        list: "/activity-logs",
        visibility: cap(Capability::ViewActivityLogs),
        show: None,
        edit: None,
        create: None,
        delete: None,
    },
];

/// A resource as exposed to one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResourceDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub list: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<&'static str>,
    pub can_delete: bool,
}

impl ResourceSpec {
    fn describe(&self, matrix: &PermissionMatrix, role: Option<Role>) -> Option<ResourceDescriptor> {
        if !self.visibility.is_satisfied(matrix, role) {
            return None;
        }

        let granted = |spec: Option<ActionSpec>| {
            spec.filter(|a| a.requires.is_satisfied(matrix, role))
                .map(|a| a.route)
        };

        Some(ResourceDescriptor {
            name: self.name,
            label: self.label,
            icon: self.icon,
            list: self.list,
            show: granted(self.show),
            edit: granted(self.edit),
            create: granted(self.create),
            can_delete: self
                .delete
                .is_some_and(|r| r.is_satisfied(matrix, role)),
        })
    }
}

/// Builds the ordered catalog for `role` against `matrix`.
pub fn build_catalog(matrix: &PermissionMatrix, role: Option<Role>) -> Vec<ResourceDescriptor> {
    RESOURCES
        .iter()
        .filter_map(|spec| spec.describe(matrix, role))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(catalog: &[ResourceDescriptor]) -> Vec<&'static str> {
        catalog.iter().map(|r| r.name).collect()
    }

    fn find<'a>(catalog: &'a [ResourceDescriptor], name: &str) -> Option<&'a ResourceDescriptor> {
        catalog.iter().find(|r| r.name == name)
    }

    #[test]
    fn test_every_resource_is_gated_by_a_capability() {
        for spec in RESOURCES {
            assert!(
                !spec.visibility.capabilities().is_empty(),
                "{} is visible without a capability",
                spec.name
            );
        }
    }

    #[test]
    fn test_therapist_catalog() {
        let catalog = build_catalog(PermissionMatrix::standard(), Some(Role::Therapist));
        assert_eq!(
            names(&catalog),
            vec!["dashboard", "bookings", "my-profile", "services"]
        );

        let bookings = find(&catalog, "bookings").unwrap();
        assert_eq!(bookings.edit, Some("/bookings/edit/:id"));
        assert_eq!(bookings.create, None);
        assert!(!bookings.can_delete);

        let services = find(&catalog, "services").unwrap();
        assert_eq!(services.show, Some("/services/show/:id"));
        assert_eq!(services.edit, None);
    }

    #[test]
    fn test_admin_does_not_see_my_profile() {
        let catalog = build_catalog(PermissionMatrix::standard(), Some(Role::Admin));
        assert!(find(&catalog, "my-profile").is_none());
        assert!(find(&catalog, "customers").is_some());
        assert!(find(&catalog, "system-settings").is_none());
    }

    #[test]
    fn test_super_admin_superset_of_admin() {
        let matrix = PermissionMatrix::standard();
        let admin = names(&build_catalog(matrix, Some(Role::Admin)));
        let super_admin = names(&build_catalog(matrix, Some(Role::SuperAdmin)));
        for name in admin {
            assert!(super_admin.contains(&name), "super_admin is missing {name}");
        }
        for name in ["system-settings", "user-management", "activity-logs"] {
            assert!(super_admin.contains(&name));
        }
    }

    #[test]
    fn test_no_role_and_customer_get_empty_catalog() {
        let matrix = PermissionMatrix::standard();
        assert!(build_catalog(matrix, None).is_empty());
        assert!(build_catalog(matrix, Some(Role::Customer)).is_empty());
    }

    #[test]
    fn test_customers_never_offer_create() {
        let catalog = build_catalog(PermissionMatrix::standard(), Some(Role::SuperAdmin));
        let customers = find(&catalog, "customers").unwrap();
        assert_eq!(customers.create, None);
        assert!(customers.can_delete);
    }

    #[test]
    fn test_order_is_stable_and_follows_the_table() {
        let matrix = PermissionMatrix::standard();
        let first = build_catalog(matrix, Some(Role::SuperAdmin));
        let second = build_catalog(matrix, Some(Role::SuperAdmin));
        assert_eq!(first, second);

        let table_order: Vec<&str> = RESOURCES.iter().map(|r| r.name).collect();
        let mut positions = names(&first)
            .into_iter()
            .map(|n| table_order.iter().position(|t| *t == n).unwrap());
        let mut last = positions.next().unwrap();
        for next in positions {
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn test_toggling_a_capability_only_touches_what_it_gates() {
        let base = PermissionMatrix::standard();
        for role in Role::ALL {
            let before = build_catalog(base, Some(role));
            for capability in Capability::ALL {
                let toggled = if base.can_access(Some(role), *capability) {
                    base.without_grant(role, *capability)
                } else {
                    base.with_grant(role, *capability)
                };
                let after = build_catalog(&toggled, Some(role));

                for spec in RESOURCES {
                    let mentions = spec.visibility.capabilities().contains(capability)
                        || [spec.show, spec.edit, spec.create]
                            .into_iter()
                            .flatten()
                            .any(|a| a.requires.capabilities().contains(capability))
                        || spec
                            .delete
                            .is_some_and(|r| r.capabilities().contains(capability));
                    if !mentions {
                        assert_eq!(
                            find(&before, spec.name),
                            find(&after, spec.name),
                            "{capability} changed {} for {role}",
                            spec.name
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_removing_delete_keeps_the_resource() {
        let matrix = PermissionMatrix::standard().without_grant(Role::Admin, Capability::DeleteBookings);
        let catalog = build_catalog(&matrix, Some(Role::Admin));
        let bookings = find(&catalog, "bookings").unwrap();
        assert!(!bookings.can_delete);
        assert_eq!(bookings.edit, Some("/bookings/edit/:id"));
    }
}

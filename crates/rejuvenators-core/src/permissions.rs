//! Permission matrix and access evaluator.
//!
//! Every role's capability set is listed explicitly in [`standard_grants`].
//! There is no inheritance between roles: a super admin holds everything an
//! admin holds because both lists say so, not because one derives from the
//! other. Anything not listed is denied.
//!
//! # Example
//!
//! ```ignore
//! use rejuvenators_core::permissions::{Capability, can_access};
//! use rejuvenators_core::roles::Role;
//!
//! assert!(can_access(Some(Role::Admin), Capability::DeleteBookings));
//! assert!(!can_access(None, Capability::ViewDashboard));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use crate::roles::Role;

macro_rules! define_capabilities {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident => $name:literal
        ),+ $(,)?
    ) => {
        /// A named boolean permission flag evaluated against a role.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Capability {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl Capability {
            pub const ALL: &'static [Capability] = &[$(Capability::$variant),+];

            /// The wire name used by the console, e.g. `canViewDashboard`.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Capability::$variant => $name,)+
                }
            }

            pub fn from_name(name: &str) -> Option<Capability> {
                match name {
                    $($name => Some(Capability::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

define_capabilities! {
    ViewDashboard => "canViewDashboard",
    /// List and show every booking
    ViewAllBookings => "canViewAllBookings",
    /// List and show bookings assigned to the caller's therapist profile
    ViewOwnBookings => "canViewOwnBookings",
    CreateBookings => "canCreateBookings",
    EditAllBookings => "canEditAllBookings",
    EditOwnBookings => "canEditOwnBookings",
    DeleteBookings => "canDeleteBookings",
    ManagePayments => "canManagePayments",
    /// Move a booking out of a terminal status
    OverrideTerminalStatus => "canOverrideTerminalStatus",
    ViewTherapists => "canViewTherapists",
    CreateTherapists => "canCreateTherapists",
    EditTherapists => "canEditTherapists",
    DeleteTherapists => "canDeleteTherapists",
    /// Edit one's own account. Held by several roles; the therapist profile
    /// page additionally requires the therapist role.
    EditOwnProfile => "canEditOwnProfile",
    ViewCustomers => "canViewCustomers",
    EditCustomers => "canEditCustomers",
    DeleteCustomers => "canDeleteCustomers",
    ViewServices => "canViewServices",
    CreateServices => "canCreateServices",
    EditServices => "canEditServices",
    DeleteServices => "canDeleteServices",
    ViewReports => "canViewReports",
    AccessSystemSettings => "canAccessSystemSettings",
    ManageUsers => "canManageUsers",
    ViewActivityLogs => "canViewActivityLogs",
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Capability::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(UnknownCapability(name)))
    }
}

/// A capability name with no entry in [`Capability`]. This is a
/// configuration error, never a user-facing denial.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown capability: {0}")]
pub struct UnknownCapability(pub String);

/// The explicit capability list for each role.
///
/// The match is exhaustive, so adding a role fails to compile until its
/// list is written out here.
pub fn standard_grants(role: Role) -> &'static [Capability] {
    use Capability::*;

    match role {
        Role::SuperAdmin => &[
            ViewDashboard,
            ViewAllBookings,
            ViewOwnBookings,
            CreateBookings,
            EditAllBookings,
            EditOwnBookings,
            DeleteBookings,
            ManagePayments,
            OverrideTerminalStatus,
            ViewTherapists,
            CreateTherapists,
            EditTherapists,
            DeleteTherapists,
            EditOwnProfile,
            ViewCustomers,
            EditCustomers,
            DeleteCustomers,
            ViewServices,
            CreateServices,
            EditServices,
            DeleteServices,
            ViewReports,
            AccessSystemSettings,
            ManageUsers,
            ViewActivityLogs,
        ],
        Role::Admin => &[
            ViewDashboard,
            ViewAllBookings,
            CreateBookings,
            EditAllBookings,
            DeleteBookings,
            ManagePayments,
            ViewTherapists,
            CreateTherapists,
            EditTherapists,
            DeleteTherapists,
            EditOwnProfile,
            ViewCustomers,
            EditCustomers,
            DeleteCustomers,
            ViewServices,
            CreateServices,
            EditServices,
            DeleteServices,
            ViewReports,
        ],
        Role::Therapist => &[
            ViewDashboard,
            ViewOwnBookings,
            EditOwnBookings,
            EditOwnProfile,
            ViewServices,
        ],
        // Customers book through the public site and get nothing here.
        Role::Customer => &[],
    }
}

/// Immutable `Role -> Set<Capability>` mapping.
///
/// [`PermissionMatrix::standard`] is the process-wide instance. Derived
/// matrices (`with_grant`, `without_grant`) are new values; nothing mutates
/// a matrix after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMatrix {
    grants: BTreeMap<Role, BTreeSet<Capability>>,
}

impl PermissionMatrix {
    pub fn standard() -> &'static PermissionMatrix {
        static STANDARD: OnceLock<PermissionMatrix> = OnceLock::new();
        STANDARD.get_or_init(|| {
            PermissionMatrix::from_grants(Role::ALL.iter().map(|role| (*role, standard_grants(*role))))
        })
    }

    /// A matrix that grants nothing to anyone.
    pub fn empty() -> Self {
        Self {
            grants: BTreeMap::new(),
        }
    }

    pub fn from_grants<'a, I>(table: I) -> Self
    where
        I: IntoIterator<Item = (Role, &'a [Capability])>,
    {
        let mut grants: BTreeMap<Role, BTreeSet<Capability>> = BTreeMap::new();
        for (role, capabilities) in table {
            grants
                .entry(role)
                .or_default()
                .extend(capabilities.iter().copied());
        }
        Self { grants }
    }

    #[must_use]
    pub fn with_grant(&self, role: Role, capability: Capability) -> Self {
        let mut next = self.clone();
        next.grants.entry(role).or_default().insert(capability);
        next
    }

    #[must_use]
    pub fn without_grant(&self, role: Role, capability: Capability) -> Self {
        let mut next = self.clone();
        if let Some(set) = next.grants.get_mut(&role) {
            set.remove(&capability);
        }
        next
    }

    /// Capabilities held by `role`, in declaration order.
    pub fn capabilities(&self, role: Role) -> impl Iterator<Item = Capability> + '_ {
        self.grants.get(&role).into_iter().flatten().copied()
    }

    /// Total, side-effect-free check. An absent role holds nothing.
    pub fn can_access(&self, role: Option<Role>, capability: Capability) -> bool {
        match role {
            Some(role) => self
                .grants
                .get(&role)
                .is_some_and(|set| set.contains(&capability)),
            None => false,
        }
    }

    /// Name-based check that reports unknown names instead of denying.
    pub fn try_can_access_named(
        &self,
        role: Option<Role>,
        name: &str,
    ) -> Result<bool, UnknownCapability> {
        let capability =
            Capability::from_name(name).ok_or_else(|| UnknownCapability(name.to_string()))?;
        Ok(self.can_access(role, capability))
    }

    /// Name-based check for untrusted input. Unknown names deny and are
    /// reported as configuration errors.
    pub fn can_access_named(&self, role: Option<Role>, name: &str) -> bool {
        match self.try_can_access_named(role, name) {
            Ok(granted) => granted,
            Err(err) => {
                tracing::error!(capability = %name, error = %err, "Capability check against unknown name; denying");
                false
            }
        }
    }
}

/// Checks `capability` for `role` against the standard matrix.
pub fn can_access(role: Option<Role>, capability: Capability) -> bool {
    PermissionMatrix::standard().can_access(role, capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlisted_capabilities_are_denied() {
        let matrix = PermissionMatrix::standard();
        for role in Role::ALL {
            let listed = standard_grants(role);
            for capability in Capability::ALL {
                assert_eq!(
                    matrix.can_access(Some(role), *capability),
                    listed.contains(capability),
                    "{role} / {capability}"
                );
            }
        }
    }

    #[test]
    fn test_absent_role_is_denied_everything() {
        for capability in Capability::ALL {
            assert!(!can_access(None, *capability));
        }
    }

    #[test]
    fn test_customer_holds_nothing() {
        assert_eq!(PermissionMatrix::standard().capabilities(Role::Customer).count(), 0);
    }

    #[test]
    fn test_super_admin_superset_of_admin() {
        let matrix = PermissionMatrix::standard();
        for capability in matrix.capabilities(Role::Admin) {
            assert!(matrix.can_access(Some(Role::SuperAdmin), capability));
        }
    }

    #[test]
    fn test_therapist_cannot_edit_all_bookings() {
        assert!(can_access(Some(Role::Therapist), Capability::EditOwnBookings));
        assert!(!can_access(Some(Role::Therapist), Capability::EditAllBookings));
        assert!(!can_access(Some(Role::Therapist), Capability::DeleteBookings));
    }

    #[test]
    fn test_only_super_admin_overrides_terminal_status() {
        for role in Role::ALL {
            assert_eq!(
                can_access(Some(role), Capability::OverrideTerminalStatus),
                role == Role::SuperAdmin
            );
        }
    }

    #[test]
    fn test_names_round_trip() {
        for capability in Capability::ALL {
            assert_eq!(Capability::from_name(capability.name()), Some(*capability));
        }
        assert_eq!(Capability::from_name("canFly"), None);
    }

    #[test]
    fn test_unknown_name_reports_error_or_denies() {
        let matrix = PermissionMatrix::standard();
        assert_eq!(
            matrix.try_can_access_named(Some(Role::SuperAdmin), "canFly"),
            Err(UnknownCapability("canFly".to_string()))
        );
        assert!(!matrix.can_access_named(Some(Role::SuperAdmin), "canFly"));
        assert!(matrix.can_access_named(Some(Role::Admin), "canViewReports"));
    }

    #[test]
    fn test_derived_matrices_leave_the_original_untouched() {
        let base = PermissionMatrix::standard();
        let granted = base.with_grant(Role::Therapist, Capability::ViewReports);
        assert!(granted.can_access(Some(Role::Therapist), Capability::ViewReports));
        assert!(!base.can_access(Some(Role::Therapist), Capability::ViewReports));

        let revoked = base.without_grant(Role::Admin, Capability::ViewReports);
        assert!(!revoked.can_access(Some(Role::Admin), Capability::ViewReports));
        assert!(base.can_access(Some(Role::Admin), Capability::ViewReports));
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Capability::DeleteBookings).unwrap();
        assert_eq!(json, r#""canDeleteBookings""#);
        let parsed: Capability = serde_json::from_str(r#""canManageUsers""#).unwrap();
        assert_eq!(parsed, Capability::ManageUsers);
        assert!(serde_json::from_str::<Capability>(r#""canFly""#).is_err());
    }
}

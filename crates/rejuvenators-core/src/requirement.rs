//! Access requirements shared by the resource catalog and route guards.
//!
//! A requirement is either a plain capability, or a composite predicate.
//! [`Requirement::CapabilityForRole`] is the two-factor gate used for pages
//! that belong to exactly one role: holding the capability is not enough,
//! the role must match too.

use std::fmt;

use crate::permissions::{Capability, PermissionMatrix};
use crate::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any resolved identity, with or without a role.
    Authenticated,
    Capability { capability: Capability },
    CapabilityForRole { capability: Capability, role: Role },
    AnyOf { of: &'static [Requirement] },
    AllOf { of: &'static [Requirement] },
}

impl Requirement {
    pub const fn capability(capability: Capability) -> Self {
        Requirement::Capability { capability }
    }

    pub const fn capability_for_role(capability: Capability, role: Role) -> Self {
        Requirement::CapabilityForRole { capability, role }
    }

    /// Evaluates the requirement for an identity that has been resolved.
    /// `role` is `None` for identities without a recognised role.
    pub fn is_satisfied(&self, matrix: &PermissionMatrix, role: Option<Role>) -> bool {
        match self {
            Requirement::Authenticated => true,
            Requirement::Capability { capability } => matrix.can_access(role, *capability),
            Requirement::CapabilityForRole {
                capability,
                role: required,
            } => role == Some(*required) && matrix.can_access(role, *capability),
            Requirement::AnyOf { of } => of.iter().any(|r| r.is_satisfied(matrix, role)),
            Requirement::AllOf { of } => of.iter().all(|r| r.is_satisfied(matrix, role)),
        }
    }

    /// Every capability this requirement mentions.
    pub fn capabilities(&self) -> Vec<Capability> {
        match self {
            Requirement::Authenticated => Vec::new(),
            Requirement::Capability { capability }
            | Requirement::CapabilityForRole { capability, .. } => vec![*capability],
            Requirement::AnyOf { of } | Requirement::AllOf { of } => {
                of.iter().flat_map(|r| r.capabilities()).collect()
            }
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Authenticated => f.write_str("authenticated"),
            Requirement::Capability { capability } => write!(f, "{}", capability),
            Requirement::CapabilityForRole { capability, role } => {
                write!(f, "{} and role {}", capability, role)
            }
            Requirement::AnyOf { of } => write_joined(f, of, " or "),
            Requirement::AllOf { of } => write_joined(f, of, " and "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, of: &[Requirement], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, r) in of.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", r)?;
    }
    f.write_str(")")
}

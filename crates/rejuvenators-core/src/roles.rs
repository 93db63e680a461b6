//! Console roles.
//!
//! A role is fixed for the lifetime of a session and comes from the identity
//! lookup. An absent or unrecognised role is represented as `Option::None` at
//! every call site and is denied everything.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Therapist,
    Customer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::Therapist, Role::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Therapist => "therapist",
            Role::Customer => "customer",
        }
    }

    /// Parses a role claim, treating anything unrecognised as "no role".
    pub fn parse_claim(value: Option<&str>) -> Option<Role> {
        let raw = value?;
        match raw.parse() {
            Ok(role) => Some(role),
            Err(_) => {
                tracing::warn!(role = %raw, "Unrecognised role claim; treating identity as role-less");
                None
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid role: {0}")]
pub struct InvalidRole(pub String);

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "therapist" => Ok(Role::Therapist),
            "customer" => Ok(Role::Customer),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

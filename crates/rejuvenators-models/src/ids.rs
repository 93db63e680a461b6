//! Strongly-typed ID newtypes.
//!
//! A booking's `therapist_id` and an identity's `therapist_id` are both
//! [`TherapistId`], so the ownership check cannot compare against a user or
//! customer id by mistake.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;

// `transparent` makes each id bind, decode and serialize exactly like the
// wrapped `Uuid`, including `uuid[]` for `= ANY($1)` filters.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize, sqlx::Type, ToSchema,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        #[schema(value_type = String, format = "uuid")]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

define_id!(
    /// Console user account.
    UserId
);

define_id!(BookingId);

define_id!(CustomerId);

define_id!(
    /// Therapist profile (not the therapist's user account).
    TherapistId
);

define_id!(ServiceId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let uuid = Uuid::from_u128(0x12345678_1234_1234_1234_123456789abc);
        let id = BookingId::from_uuid(uuid);
        assert_eq!(id.to_string(), "12345678-1234-1234-1234-123456789abc");
        assert_eq!("12345678-1234-1234-1234-123456789abc".parse::<BookingId>().unwrap(), id);
        assert!("nope".parse::<BookingId>().is_err());
    }

    #[test]
    fn test_debug_names_the_type() {
        let id = TherapistId::from_uuid(Uuid::nil());
        assert!(format!("{:?}", id).starts_with("TherapistId("));
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = CustomerId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.into_inner()));
        let back: CustomerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

//! Access token claims.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use rejuvenators_core::Role;

/// Claims carried by an access token.
///
/// `role` is kept as the raw claim string. It is parsed once when the
/// identity is built, and anything unrecognised becomes "no role".
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    /// Therapist profile linked to this user, for therapist accounts
    #[serde(default)]
    pub therapist_id: Option<Uuid>,
    /// Expiration (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    pub fn role(&self) -> Option<Role> {
        Role::parse_claim(self.role.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_deserialize_without_optional_fields() {
        let json = r#"{"sub":"u-1","email":"a@test.com","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert!(claims.role.is_none());
        assert!(claims.therapist_id.is_none());
        assert_eq!(claims.role(), None);
    }

    #[test]
    fn test_role_claim_is_parsed() {
        let json = r#"{"sub":"u-2","email":"t@test.com","role":"therapist","exp":1,"iat":1}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.role(), Some(Role::Therapist));
    }

    #[test]
    fn test_unknown_role_claim_means_no_role() {
        let json = r#"{"sub":"u-3","email":"x@test.com","role":"owner","exp":1,"iat":1}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.role.as_deref(), Some("owner"));
        assert_eq!(claims.role(), None);
    }
}

//! The signed-in user as seen by authorization checks.

use serde::Serialize;
use utoipa::ToSchema;

use rejuvenators_auth::Claims;
use rejuvenators_core::{AppError, Role};

use crate::ids::{TherapistId, UserId};

/// A resolved identity. `role` is `None` when the token carries no role or
/// one the API does not recognise; such identities are denied everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub role: Option<Role>,
    pub therapist_id: Option<TherapistId>,
}

impl Identity {
    pub fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AppError::unauthorized("Invalid subject in token".to_string()))?;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            role: claims.role(),
            therapist_id: claims.therapist_id.map(TherapistId::from_uuid),
        })
    }

    /// Whether this identity is linked to `therapist_id`.
    pub fn owns(&self, therapist_id: TherapistId) -> bool {
        self.therapist_id == Some(therapist_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims(role: Option<&str>, therapist_id: Option<Uuid>) -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            email: "someone@test.com".to_string(),
            role: role.map(str::to_string),
            therapist_id,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_from_claims() {
        let therapist = Uuid::new_v4();
        let identity = Identity::from_claims(&claims(Some("therapist"), Some(therapist))).unwrap();
        assert_eq!(identity.role, Some(Role::Therapist));
        assert!(identity.owns(TherapistId::from_uuid(therapist)));
        assert!(!identity.owns(TherapistId::new()));
    }

    #[test]
    fn test_unknown_role_resolves_to_none() {
        let identity = Identity::from_claims(&claims(Some("janitor"), None)).unwrap();
        assert_eq!(identity.role, None);
    }

    #[test]
    fn test_bad_subject_is_unauthorized() {
        let mut c = claims(Some("admin"), None);
        c.sub = "not-a-uuid".to_string();
        let err = Identity::from_claims(&c).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }
}

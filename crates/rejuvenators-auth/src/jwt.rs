//! HS256 token encode and verify.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use rejuvenators_config::JwtConfig;
use rejuvenators_core::{AppError, Role};

use crate::claims::Claims;

/// Mints an access token valid for `jwt_config.access_token_expiry` seconds.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: Option<Role>,
    therapist_id: Option<Uuid>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.map(|r| r.as_str().to_string()),
        therapist_id,
        exp,
        iat: now,
    };

    encode_claims(&claims, jwt_config)
}

/// Signs an arbitrary claim set, e.g. one carrying a role string the API
/// does not recognise.
pub fn encode_claims(claims: &Claims, jwt_config: &JwtConfig) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies signature and expiry. Any failure is a 401.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token".to_string()))
}

//! Where the caller's identity currently stands.
//!
//! Guards see one of three states. `Loading` is not a denial: the identity
//! source has not settled yet and the caller should retry.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tokio::sync::watch;

use rejuvenators_auth::verify_token;
use rejuvenators_config::JwtConfig;
use rejuvenators_core::{AppError, Role};
use rejuvenators_models::Identity;

use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityState {
    Loading,
    Anonymous,
    Resolved(Identity),
}

impl IdentityState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            IdentityState::Resolved(identity) => Some(identity),
            _ => None,
        }
    }

    /// Role of a resolved identity. `None` for every other state too.
    pub fn role(&self) -> Option<Role> {
        self.identity().and_then(|identity| identity.role)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, IdentityState::Loading)
    }
}

/// Turns bearer tokens into [`IdentityState`]s.
///
/// The resolver reports `Loading` until its readiness flag is raised, which
/// lets the process accept connections while the identity source is still
/// coming up.
#[derive(Clone, Debug)]
pub struct IdentityResolver {
    jwt_config: JwtConfig,
    ready: watch::Receiver<bool>,
}

impl IdentityResolver {
    /// A resolver that is ready immediately.
    pub fn ready(jwt_config: JwtConfig) -> Self {
        let (_tx, ready) = watch::channel(true);
        Self { jwt_config, ready }
    }

    /// A resolver that stays in `Loading` until `true` is sent on the
    /// returned sender.
    pub fn pending(jwt_config: JwtConfig) -> (Self, watch::Sender<bool>) {
        let (tx, ready) = watch::channel(false);
        (Self { jwt_config, ready }, tx)
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolves an `Authorization` header value. A malformed header or a
    /// token that fails verification is an error, not an anonymous caller.
    pub fn resolve(&self, authorization: Option<&str>) -> Result<IdentityState, AppError> {
        if !self.is_ready() {
            return Ok(IdentityState::Loading);
        }

        let Some(header) = authorization else {
            return Ok(IdentityState::Anonymous);
        };

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = verify_token(token, &self.jwt_config)?;
        Ok(IdentityState::Resolved(Identity::from_claims(&claims)?))
    }
}

impl FromRequestParts<AppState> for IdentityState {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .map(|value| {
                value.to_str().map_err(|_| {
                    AppError::unauthorized("Invalid authorization header".to_string())
                })
            })
            .transpose()?;

        state.identity.resolve(authorization)
    }
}

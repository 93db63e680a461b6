//! # Rejuvenators Auth
//!
//! Bearer token handling for the admin API. Tokens are issued by the hosted
//! identity provider; this crate only reads them (and mints development
//! tokens for the CLI and tests).
//!
//! - [`claims`]: the claim set carried by an access token
//! - [`jwt`]: HS256 encode/verify
//!
//! ```ignore
//! use rejuvenators_auth::{create_access_token, verify_token};
//!
//! let token = create_access_token(user_id, "ops@rejuvenators.test", Some(Role::Admin), None, &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, encode_claims, verify_token};

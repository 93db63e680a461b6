//! # Rejuvenators Config
//!
//! Configuration types for the Rejuvenators admin API, each loaded from
//! environment variables with development defaults:
//!
//! - [`jwt`]: bearer token signing
//! - [`cors`]: allowed console origins
//! - [`server`]: bind address and metrics port
//! - [`storage`]: store backend and photo uploads
//! - [`booking`]: booking lifecycle policy
//!
//! ```ignore
//! use rejuvenators_config::{BookingPolicyConfig, JwtConfig, StorageConfig};
//!
//! let jwt = JwtConfig::from_env();
//! let storage = StorageConfig::from_env();
//! let policy = BookingPolicyConfig::from_env();
//! ```

pub mod booking;
pub mod cors;
pub mod jwt;
pub mod server;
pub mod storage;

pub use booking::BookingPolicyConfig;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;
pub use storage::{StorageConfig, StoreBackend};

/// Reads `key` and parses it, falling back to `default` when unset or invalid.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

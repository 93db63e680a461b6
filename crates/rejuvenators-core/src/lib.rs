//! Shared building blocks for the Rejuvenators admin API: the error type,
//! pagination, roles and capabilities, access requirements, the resource
//! catalog and file storage.

pub mod catalog;
pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod permissions;
pub mod requirement;
pub mod roles;
pub mod serde;

pub use catalog::{ResourceDescriptor, build_catalog};
pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use permissions::{Capability, PermissionMatrix, can_access};
pub use requirement::Requirement;
pub use roles::Role;

//! Store backend selection and photo upload settings.
//!
//! - `STORE_BACKEND`: `postgres` (default) or `memory`
//! - `UPLOAD_DIR`: local directory for uploads (default `./uploads`)
//! - `PUBLIC_FILES_URL`: URL prefix uploads are served from
//! - `PHOTO_BUCKET`: bucket for therapist photos (default `therapist-photos`)
//! - `MAX_UPLOAD_BYTES`: upload size cap (default 5 MiB)

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local maps, for development and tests.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Postgres => f.write_str("postgres"),
            StoreBackend::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StoreBackend,
    pub upload_dir: PathBuf,
    pub public_files_url: String,
    pub photo_bucket: String,
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Postgres,
            upload_dir: PathBuf::from("./uploads"),
            public_files_url: "http://localhost:3000/files".to_string(),
            photo_bucket: "therapist-photos".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let backend = match env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Falling back to postgres store backend");
                StoreBackend::Postgres
            }),
            Err(_) => defaults.backend,
        };

        Self {
            backend,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            public_files_url: env::var("PUBLIC_FILES_URL").unwrap_or(defaults.public_files_url),
            photo_bucket: env::var("PHOTO_BUCKET").unwrap_or(defaults.photo_bucket),
            max_upload_bytes: crate::env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }
}

//! Bucket-scoped file storage.
//!
//! Uploads are addressed by `(bucket, key)`. A backend stores the bytes and
//! returns the key; [`FileStorage::public_url`] turns that key into a URL the
//! console can render. Display URLs for images go through
//! [`optimized_image_url`], which only appends resize hints. Nothing is
//! resized server-side.
//!
//! ```ignore
//! let storage = LocalFileStorage::new(PathBuf::from("./uploads"), "http://localhost:3000/files".into());
//! let key = storage.save("therapist-photos", "abc/photo.jpg", &bytes).await?;
//! let url = storage.public_url("therapist-photos", &key)?;
//! let avatar = optimized_image_url(&url, 160, 160);
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::fs;

/// Quality hint appended to optimised display URLs.
pub const DISPLAY_IMAGE_QUALITY: u8 = 80;

const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// A storage backend. Implementations must be shareable across handlers.
pub trait FileStorage: Send + Sync {
    /// Stores `content` under `bucket/key` and returns the key.
    fn save<'a>(&'a self, bucket: &'a str, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Removes `bucket/key`. Missing files are not an error.
    fn delete<'a>(&'a self, bucket: &'a str, key: &'a str) -> StorageFuture<'a, ()>;

    fn public_url(&self, bucket: &str, key: &str) -> Result<String, StorageError>;

    /// Inverse of [`FileStorage::public_url`]. `None` when `url` was not
    /// issued by this backend for `bucket`.
    fn key_from_url<'u>(&self, bucket: &str, url: &'u str) -> Option<&'u str>;

    /// Upper bound accepted by [`FileStorage::save`].
    fn max_file_size(&self) -> usize;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File exceeds maximum size of {max_bytes} bytes")]
    InvalidFileSize { max_bytes: usize },

    #[error("MIME type '{received}' not allowed. Allowed types: {}", allowed.join(", "))]
    InvalidMimeType {
        received: String,
        allowed: Vec<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Image types accepted for profile photos.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// Maps an accepted image MIME type to its file extension.
pub fn image_extension(content_type: &str) -> Result<&'static str, StorageError> {
    match content_type {
        "image/png" => Ok("png"),
        "image/jpeg" => Ok("jpg"),
        "image/webp" => Ok("webp"),
        other => Err(StorageError::InvalidMimeType {
            received: other.to_string(),
            allowed: ALLOWED_IMAGE_TYPES.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

/// Appends `width`, `height` and `quality` hints to an absolute http(s) URL.
/// Anything else is returned untouched.
pub fn optimized_image_url(url: &str, width: u32, height: u32) -> String {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{url}{separator}width={width}&height={height}&quality={DISPLAY_IMAGE_QUALITY}"
    )
}

/// Stores files under `base_dir/<bucket>/<key>` and serves them from
/// `base_url/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
    max_file_size: usize,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self::with_max_size(base_dir, base_url, DEFAULT_MAX_FILE_SIZE)
    }

    pub fn with_max_size(base_dir: PathBuf, base_url: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            base_url,
            max_file_size,
        }
    }

    /// Rejects empty segments, traversal, absolute paths and odd characters.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with '/'".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.')
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_bucket(bucket: &str) -> Result<(), StorageError> {
        if bucket.contains('/') {
            return Err(StorageError::InvalidKey(
                "Bucket must be a single path segment".to_string(),
            ));
        }
        Self::validate_key(bucket)
    }

    fn path_for(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        Self::validate_bucket(bucket)?;
        Self::validate_key(key)?;
        Ok(self.base_dir.join(bucket).join(key))
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, bucket: &'a str, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            let file_path = self.path_for(bucket, key)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            tracing::debug!(bucket = %bucket, key = %key, bytes = content.len(), "Stored file");
            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, bucket: &'a str, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let file_path = self.path_for(bucket, key)?;
            match fs::remove_file(&file_path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn public_url(&self, bucket: &str, key: &str) -> Result<String, StorageError> {
        Self::validate_bucket(bucket)?;
        Self::validate_key(key)?;
        Ok(format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket,
            key
        ))
    }

    fn key_from_url<'u>(&self, bucket: &str, url: &'u str) -> Option<&'u str> {
        Self::validate_bucket(bucket).ok()?;
        let key = url
            .strip_prefix(self.base_url.trim_end_matches('/'))?
            .strip_prefix('/')?
            .strip_prefix(bucket)?
            .strip_prefix('/')?;
        Self::validate_key(key).ok().map(|()| key)
    }

    fn max_file_size(&self) -> usize {
        self.max_file_size
    }
}

//! Uploaded file storage.

use crate::errors::ServiceError;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Extensions accepted by the upload route
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "pdf", "epub"];

/// Where uploaded bytes end up.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persists `bytes` and returns the stored file name.
    async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, ServiceError>;
}

/// Stores files in a directory served under `/uploads`.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, ServiceError> {
        let extension = allowed_extension(original_name)?;
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ServiceError::StorageError(e.to_string()))?;

        let name = stored_name(&extension);
        fs::write(self.root.join(&name), bytes)
            .await
            .map_err(|e| ServiceError::StorageError(e.to_string()))?;

        info!(file = %name, "file stored");
        Ok(name)
    }
}

/// Lower-cased extension of `file_name` if uploads of that type are accepted.
pub fn allowed_extension(file_name: &str) -> Result<String, ServiceError> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| ServiceError::invalid_field("file", "Unsupported file type"))
}

/// `<unix millis>-<random hex>.<ext>`; never derived from the client's name.
fn stored_name(extension: &str) -> String {
    let suffix: u32 = rand::random();
    format!("{}-{:08x}.{}", Utc::now().timestamp_millis(), suffix, extension)
}

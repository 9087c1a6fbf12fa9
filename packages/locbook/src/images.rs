//! Storage for user-submitted screenshots.

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist a screenshot and return its reference relative to the store root.
    async fn save_screenshot(&self, bytes: &[u8]) -> Result<String, StoreError>;

    /// Delete a screenshot previously returned by `save_screenshot`.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;
}

/// Writes `screenshots/YYYY-MM-DD/<uuid>.jpg` under a root directory.
pub struct DiskImageStore {
    root: PathBuf,
}

impl DiskImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Relative path for a new screenshot taken today.
pub fn screenshot_path() -> String {
    format!(
        "screenshots/{}/{}.jpg",
        Utc::now().format("%Y-%m-%d"),
        Uuid::new_v4()
    )
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save_screenshot(&self, bytes: &[u8]) -> Result<String, StoreError> {
        let relative = screenshot_path();
        let full = self.root.join(&relative);

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Backend(Box::new(e)))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;

        debug!(path = %full.display(), size = bytes.len(), "Saved screenshot");
        Ok(relative)
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        tokio::fs::remove_file(self.root.join(path))
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))
    }
}

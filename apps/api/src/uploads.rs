//! On-disk storage for uploaded CVs.
//!
//! Every upload lands under a fresh `<uuid>.<ext>` name, so concurrent
//! requests never collide and no locking is needed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::RetentionPolicy;
use crate::errors::AppError;
use crate::intake::form::UploadedFile;

/// A stored upload.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub storage_path: PathBuf,
    pub original_file_name: String,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
    retention: RetentionPolicy,
}

impl UploadDir {
    /// Creates the directory if it does not exist yet. The root is made
    /// absolute so stored paths stay valid whatever the working directory.
    pub async fn open(root: impl Into<PathBuf>, retention: RetentionPolicy) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create uploads directory {}", root.display()))?;
        let root = tokio::fs::canonicalize(&root)
            .await
            .with_context(|| format!("Failed to resolve uploads directory {}", root.display()))?;

        info!(
            "Uploads directory ready at {} (retention: {:?})",
            root.display(),
            retention
        );
        Ok(Self { root, retention })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn store(&self, file: &UploadedFile) -> Result<UploadedDocument, AppError> {
        let name = match extension_of(&file.file_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let storage_path = self.root.join(name);

        tokio::fs::write(&storage_path, &file.data)
            .await
            .map_err(|e| {
                AppError::Storage(format!("writing {}: {e}", storage_path.display()))
            })?;

        debug!(
            "Stored upload '{}' ({} bytes) at {}",
            file.file_name,
            file.data.len(),
            storage_path.display()
        );

        Ok(UploadedDocument {
            storage_path,
            original_file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            size: file.data.len(),
        })
    }

    /// Applies the retention policy once the submission's fate is known.
    /// Returns whether the file was removed.
    pub async fn settle(
        &self,
        document: &UploadedDocument,
        accepted: bool,
    ) -> Result<bool, AppError> {
        if accepted || self.retention == RetentionPolicy::Keep {
            return Ok(false);
        }

        tokio::fs::remove_file(&document.storage_path)
            .await
            .map_err(|e| {
                AppError::Retention(format!(
                    "removing {}: {e}",
                    document.storage_path.display()
                ))
            })?;

        debug!("Discarded rejected upload {}", document.storage_path.display());
        Ok(true)
    }
}

/// Original extension, kept only if it is plain alphanumerics.
fn extension_of(file_name: &str) -> Option<&str> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

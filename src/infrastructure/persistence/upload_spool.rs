use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Transient on-disk copy of an incoming upload. Each spooled file is scoped
/// to one request and guaranteed removed on every exit path: callers discard
/// it explicitly on success, and the Drop guard covers early returns.
pub struct UploadSpool {
    spool_dir: PathBuf,
}

impl UploadSpool {
    pub fn new(spool_dir: PathBuf) -> Self {
        Self { spool_dir }
    }

    /// Write the bytes to a uniquely named file under the spool directory.
    pub async fn spool(&self, file_name: &str, bytes: &[u8]) -> Result<SpooledUpload, DomainError> {
        fs::create_dir_all(&self.spool_dir).await.map_err(|e| {
            tracing::error!("Failed to create spool directory {:?}: {}", self.spool_dir, e);
            DomainError::InternalError(format!("Failed to create spool directory: {}", e))
        })?;

        let path = self
            .spool_dir
            .join(format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name)));

        fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!("Failed to spool upload to {:?}: {}", path, e);
            DomainError::InternalError(format!("Failed to spool upload: {}", e))
        })?;

        tracing::debug!("Spooled {} bytes to {:?}", bytes.len(), path);
        Ok(SpooledUpload {
            path,
            removed: false,
        })
    }
}

/// Guard over a spooled file. Dropping it removes the file if `discard` has
/// not already done so.
pub struct SpooledUpload {
    path: PathBuf,
    removed: bool,
}

impl SpooledUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the spooled file now instead of waiting for the guard.
    pub async fn discard(mut self) {
        if let Err(e) = fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove spooled upload {:?}: {}", self.path, e);
            }
        }
        self.removed = true;
    }
}

impl Drop for SpooledUpload {
    fn drop(&mut self) {
        if !self.removed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn sanitize_file_name(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();
    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self as tokio_fs, create_dir_all, read_to_string};

use crate::domain::errors::DomainError;

/// Represents the application data directory structure
pub struct DataDirectory {
    root: PathBuf,
    users: PathBuf,
    upload_spool: PathBuf,
    logs: PathBuf,
}

impl DataDirectory {
    /// Create a new DataDirectory instance
    pub fn new(root: PathBuf) -> Self {
        let users = root.join("users");
        let upload_spool = root.join("uploads");
        let logs = root.join("logs");

        Self {
            root,
            users,
            upload_spool,
            logs,
        }
    }

    /// Initialize the data directory structure
    pub async fn initialize(&self) -> Result<(), DomainError> {
        tracing::info!("Initializing data directory at: {:?}", self.root);

        for dir in [&self.root, &self.users, &self.upload_spool, &self.logs] {
            create_dir_all(dir).await.map_err(|e| {
                tracing::error!("Failed to create directory {:?}: {}", dir, e);
                DomainError::InternalError(format!("Failed to create directory: {}", e))
            })?;
        }

        Ok(())
    }

    /// Get the user records directory
    pub fn users(&self) -> &Path {
        &self.users
    }

    /// Get the transient upload spool directory
    pub fn upload_spool(&self) -> &Path {
        &self.upload_spool
    }

    /// Get the log directory
    pub fn logs(&self) -> &Path {
        &self.logs
    }
}

/// Read a JSON file and deserialize it
pub async fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, DomainError> {
    let contents = read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DomainError::NotFound(format!("File not found: {}", path.display()))
        } else {
            tracing::error!("Failed to read file {:?}: {}", path, e);
            DomainError::InternalError(format!("Failed to read file: {}", e))
        }
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse JSON from file {:?}: {}", path, e);
        DomainError::InvalidData(format!("Invalid JSON: {}", e))
    })
}

/// Serialize data to JSON and write it to a file, creating parent directories
/// as needed
pub async fn write_json_file<T: Serialize>(path: &Path, data: &T) -> Result<(), DomainError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).await.map_err(|e| {
            tracing::error!("Failed to create parent directory for {:?}: {}", path, e);
            DomainError::InternalError(format!("Failed to create directory: {}", e))
        })?;
    }

    let json = serde_json::to_string_pretty(data).map_err(|e| {
        tracing::error!("Failed to serialize to JSON for file {:?}: {}", path, e);
        DomainError::InvalidData(format!("Failed to serialize to JSON: {}", e))
    })?;

    tokio_fs::write(path, json).await.map_err(|e| {
        tracing::error!("Failed to write to file {:?}: {}", path, e);
        DomainError::InternalError(format!("Failed to write to file: {}", e))
    })?;

    Ok(())
}


use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use url::Url;

use crate::application::dto::avatar_dto::UploadedImage;
use crate::application::errors::ApplicationError;
use crate::domain::errors::DomainError;
use crate::domain::models::asset::RemoveOutcome;
use crate::domain::repositories::asset_store::AssetStore;
use crate::domain::repositories::user_repository::UserRepository;
use crate::infrastructure::persistence::upload_spool::UploadSpool;

/// Folder in the remote asset store under which all avatars live.
pub const PROFILE_PICTURES_FOLDER: &str = "profile_pictures";

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(60);

/// Orchestrates avatar replacement: validate the upload, resolve the owner,
/// best-effort-delete the previous asset, spool the bytes, store them
/// remotely, and persist the new URL on the user record.
pub struct AvatarService {
    user_repository: Arc<dyn UserRepository>,
    asset_store: Arc<dyn AssetStore>,
    upload_spool: UploadSpool,
    store_timeout: Duration,
}

impl AvatarService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        asset_store: Arc<dyn AssetStore>,
        upload_spool: UploadSpool,
    ) -> Self {
        Self {
            user_repository,
            asset_store,
            upload_spool,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Override the bound on the remote store call. Mainly for tests.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Replace the user's avatar and return the new URL.
    ///
    /// Failure of the old-asset cleanup never aborts the request. A failure to
    /// persist the user after a successful store leaves an orphaned asset; it
    /// is logged distinctly and surfaced as an internal error.
    pub async fn upload_avatar(
        &self,
        user_id: &str,
        upload: Option<UploadedImage>,
    ) -> Result<String, ApplicationError> {
        let upload = upload
            .filter(|u| !u.bytes.is_empty())
            .ok_or_else(|| ApplicationError::ValidationError("No file uploaded!".to_string()))?;

        let mut user = self
            .user_repository
            .find_by_id(user_id)
            .await
            .map_err(|error| match error {
                DomainError::NotFound(_) => {
                    ApplicationError::NotFound("User not found!".to_string())
                }
                other => ApplicationError::from(other),
            })?;

        if let Some(old_url) = user.profile_image_url.clone() {
            self.remove_previous_asset(&old_url).await;
        }

        let spooled = self
            .upload_spool
            .spool(&upload.file_name, &upload.bytes)
            .await?;

        let store_result = tokio::time::timeout(
            self.store_timeout,
            self.asset_store.store(
                upload.bytes.clone(),
                &upload.file_name,
                PROFILE_PICTURES_FOLDER,
            ),
        )
        .await;

        // The transient copy is gone on every exit path from here on.
        spooled.discard().await;

        let stored = match store_result {
            Ok(Ok(asset)) => asset,
            Ok(Err(error)) => {
                tracing::error!("Asset store upload failed for user {}: {}", user.id, error);
                return Err(error.into());
            }
            Err(_) => {
                tracing::error!(
                    "Asset store upload timed out after {:?} for user {}",
                    self.store_timeout,
                    user.id
                );
                return Err(ApplicationError::ServiceError(
                    "Asset store upload timed out".to_string(),
                ));
            }
        };

        user.profile_image_url = Some(stored.url.clone());
        user.updated_at = Utc::now();

        if let Err(error) = self.user_repository.save(&user).await {
            tracing::error!(
                "orphaned asset {}: stored for user {} but the user record could not be saved: {}",
                stored.public_id,
                user.id,
                error
            );
            return Err(error.into());
        }

        tracing::info!("Avatar updated for user {}: {}", user.id, stored.url);
        Ok(stored.url)
    }

    /// Delete the asset behind the previous avatar URL. The outcome is logged
    /// and intentionally discarded; a second removal of an already-gone asset
    /// reports not-found rather than erroring.
    async fn remove_previous_asset(&self, old_url: &str) {
        let Some(public_id) = public_id_from_url(old_url) else {
            tracing::warn!(
                "Could not derive an asset id from previous avatar URL: {}",
                old_url
            );
            return;
        };

        match self.asset_store.remove(&public_id).await {
            Ok(RemoveOutcome::Removed) => {
                tracing::info!("Deleted old avatar asset: {}", public_id);
            }
            Ok(RemoveOutcome::NotFound) => {
                tracing::debug!("Old avatar asset already gone: {}", public_id);
            }
            Err(error) => {
                tracing::error!("Failed to delete old avatar asset {}: {}", public_id, error);
            }
        }
    }
}

/// Derive the store identifier from an avatar URL: the last path segment with
/// its extension stripped, re-qualified with the avatar folder.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let file = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())?;
    let stem = file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file);
    if stem.is_empty() {
        return None;
    }
    Some(format!("{}/{}", PROFILE_PICTURES_FOLDER, stem))
}

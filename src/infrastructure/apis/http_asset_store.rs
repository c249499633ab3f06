use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::domain::errors::DomainError;
use crate::domain::models::asset::{RemoveOutcome, StoredAsset};
use crate::domain::repositories::asset_store::AssetStore;

/// Connection settings for the remote asset store.
#[derive(Debug, Clone)]
pub struct AssetStoreConfig {
    pub base_url: Url,
    pub api_key: String,
}

/// HTTPS implementation of the asset store collaborator. Constructed
/// explicitly with its own client and config so the endpoint can swap in a
/// fake for tests.
pub struct HttpAssetStore {
    client: Client,
    config: AssetStoreConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponseBody {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseBody {
    message: String,
}

impl HttpAssetStore {
    pub fn new(client: Client, config: AssetStoreConfig) -> Self {
        Self { client, config }
    }

    fn upload_url(&self) -> Result<Url, DomainError> {
        self.config
            .base_url
            .join("upload")
            .map_err(|e| DomainError::InternalError(format!("Invalid asset store URL: {}", e)))
    }

    fn delete_url(&self, public_id: &str) -> Result<Url, DomainError> {
        self.config
            .base_url
            .join(&format!("assets/{}", public_id))
            .map_err(|e| DomainError::InternalError(format!("Invalid asset store URL: {}", e)))
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorResponseBody>().await {
            Ok(body) => body.message,
            Err(_) => format!("Asset store replied with status {}", status),
        }
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn store(
        &self,
        bytes: Bytes,
        file_name: &str,
        folder: &str,
    ) -> Result<StoredAsset, DomainError> {
        let mime = mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(&mime)
            .map_err(|e| DomainError::InternalError(format!("Invalid upload mime type: {}", e)))?;
        let form = Form::new().text("folder", folder.to_string()).part("file", part);

        let response = self
            .client
            .post(self.upload_url()?)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Asset store upload request failed: {}", e);
                DomainError::AssetStoreError(format!("Upload request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            return Err(DomainError::AssetStoreError(message));
        }

        let body = response.json::<UploadResponseBody>().await.map_err(|e| {
            tracing::error!("Asset store upload returned an unreadable body: {}", e);
            DomainError::AssetStoreError(format!("Invalid upload response: {}", e))
        })?;

        tracing::info!("Asset stored: {} -> {}", body.public_id, body.secure_url);
        Ok(StoredAsset {
            public_id: body.public_id,
            url: body.secure_url,
        })
    }

    async fn remove(&self, public_id: &str) -> Result<RemoveOutcome, DomainError> {
        let response = self
            .client
            .delete(self.delete_url(public_id)?)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| {
                DomainError::AssetStoreError(format!("Delete request failed: {}", e))
            })?;

        // Deleting an asset that is already gone is not an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(RemoveOutcome::NotFound);
        }

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            return Err(DomainError::AssetStoreError(message));
        }

        Ok(RemoveOutcome::Removed)
    }
}

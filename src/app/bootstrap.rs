use std::path::Path;
use std::sync::Arc;

use reqwest::Client;

use crate::application::services::avatar_service::AvatarService;
use crate::domain::errors::DomainError;
use crate::domain::repositories::asset_store::AssetStore;
use crate::domain::repositories::identity_provider::IdentityProvider;
use crate::domain::repositories::user_repository::UserRepository;
use crate::infrastructure::apis::http_asset_store::{AssetStoreConfig, HttpAssetStore};
use crate::infrastructure::auth::hmac_identity_provider::HmacIdentityProvider;
use crate::infrastructure::http_client::build_http_client;
use crate::infrastructure::persistence::file_system::DataDirectory;
use crate::infrastructure::persistence::upload_spool::UploadSpool;
use crate::infrastructure::repositories::file_user_repository::FileUserRepository;
use crate::presentation::http::ApiState;

use super::AppConfig;

pub(super) async fn initialize_data_directory(
    data_root: &Path,
) -> Result<DataDirectory, DomainError> {
    let data_directory = DataDirectory::new(data_root.to_path_buf());
    data_directory.initialize().await?;
    Ok(data_directory)
}

pub(super) fn build_api_state(
    config: &AppConfig,
    data_directory: &DataDirectory,
) -> Result<ApiState, DomainError> {
    let user_repository: Arc<dyn UserRepository> =
        Arc::new(FileUserRepository::new(data_directory.users().to_path_buf()));

    let client: Client = build_http_client(Client::builder())
        .map_err(|e| DomainError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
    let asset_store: Arc<dyn AssetStore> = Arc::new(HttpAssetStore::new(
        client,
        AssetStoreConfig {
            base_url: config.asset_store_url.clone(),
            api_key: config.asset_store_api_key.clone(),
        },
    ));

    let upload_spool = UploadSpool::new(data_directory.upload_spool().to_path_buf());

    let identity_provider: Arc<dyn IdentityProvider> =
        Arc::new(HmacIdentityProvider::new(config.auth_secret.clone()));

    Ok(ApiState {
        avatar_service: Arc::new(AvatarService::new(user_repository, asset_store, upload_spool)),
        identity_provider,
    })
}

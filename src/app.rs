use crate::domain::errors::DomainError;
use crate::infrastructure::persistence::file_system::DataDirectory;
use crate::presentation::http::ApiState;

mod bootstrap;
mod config;

pub use config::AppConfig;

pub struct AppState {
    pub data_directory: DataDirectory,
    pub api: ApiState,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> Result<Self, DomainError> {
        tracing::info!(
            "Initializing application with data root: {:?}",
            config.data_root
        );

        let data_directory = bootstrap::initialize_data_directory(&config.data_root).await?;
        let api = bootstrap::build_api_state(config, &data_directory)?;

        tracing::info!("Application initialized successfully");

        Ok(Self {
            data_directory,
            api,
        })
    }
}

use tokio::net::TcpListener;

use fittrack::app::{AppConfig, AppState};
use fittrack::infrastructure::logging::logger;
use fittrack::infrastructure::persistence::file_system::DataDirectory;
use fittrack::presentation::http;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    // Resolve the log directory through the same layout the rest of the app
    // uses, before any of it is initialized.
    let layout = DataDirectory::new(config.data_root.clone());
    logger::init_logger(layout.logs())?;

    let state = AppState::new(&config).await?;

    let router = http::build_router(state.api.clone());
    let listener = TcpListener::bind(config.bind_addr).await?;
    http::serve(listener, router).await?;

    Ok(())
}

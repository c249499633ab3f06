use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::services::avatar_service::AvatarService;
use crate::domain::repositories::identity_provider::IdentityProvider;

pub mod auth;
pub mod avatar_routes;

/// Accepted avatar uploads top out at 2 MiB; leave headroom for the multipart
/// framing around them.
const MAX_REQUEST_BYTES: usize = 3 * 1024 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub avatar_service: Arc<AvatarService>,
    pub identity_provider: Arc<dyn IdentityProvider>,
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/users/avatar", post(avatar_routes::upload_avatar))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until ctrl-c.
pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    let address = listener.local_addr()?;
    tracing::info!("FitTrack API listening on {}", address);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
}

use rescue_chat::core::{AppState, Config, init_tracing};
use rescue_chat::messaging::RoleCatalog;
use rescue_chat::{create_router, repositories};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration and logging first, everything else logs through tracing
    let config = Config::from_env()?;
    init_tracing(&config);
    config.print_info();

    let roles = match &config.role_catalog_path {
        Some(path) => RoleCatalog::default().load_overrides(path)?,
        None => RoleCatalog::default(),
    };
    info!(entries = roles.len(), "Role catalog ready");

    let pool = repositories::connect(&config.database_url, config.max_connections).await?;
    let state = Arc::new(AppState::new(pool, config.jwt_secret.clone(), roles));

    let app = create_router(state).layer(CorsLayer::permissive());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, app).await?;

    Ok(())
}

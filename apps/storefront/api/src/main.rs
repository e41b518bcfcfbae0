//! Storefront API - product catalog and carts over PostgreSQL

use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use migration::Migrator;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        max_connections = config.database.max_connections,
        "Connecting to PostgreSQL"
    );
    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    database::postgres::run_migrations::<Migrator>(&db, config.app.name).await?;

    let state = AppState {
        config: config.clone(),
        db,
    };

    let api_routes = api::routes(&state);
    let router = create_router::<openapi::ApiDoc>(api_routes).await?;
    let app = router
        .merge(health_router(state.config.app.clone()))
        .merge(api::health::router(state.clone()));

    info!(
        port = state.config.server.port,
        timeout_ms = state.config.reservation.timeout.as_millis() as u64,
        max_retries = state.config.reservation.max_retries,
        "Starting Storefront API"
    );

    let db = state.db.clone();
    create_production_app(app, &state.config.server, Duration::from_secs(30), async move {
        info!("Shutting down: closing PostgreSQL pool");
        if let Err(e) = db.close().await {
            tracing::warn!(error = %e, "Failed to close PostgreSQL pool cleanly");
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Storefront API shutdown complete");
    Ok(())
}

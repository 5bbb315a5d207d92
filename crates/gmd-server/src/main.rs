//! GMD Server - always-on missile defense simulation backend

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gmd_server::config::Config;
use gmd_server::state::AppState;
use gmd_server::{api, loops, persistence};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(tracing_subscriber::fmt::layer))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("gmd_server=debug".parse()?))
        .init();

    tracing::info!("Starting GMD Server...");

    let port = config.server_port;
    let state = match config.database_path.as_deref() {
        Some(path) => {
            let db = persistence::init_database(path, config.database_max_connections).await?;
            Arc::new(AppState::with_database(db, config.clone()))
        }
        None => {
            tracing::warn!("GMD_DATABASE_PATH is empty; launch log disabled");
            Arc::new(AppState::new(config.clone()))
        }
    };

    // Start background loops
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let sim_handle = tokio::spawn(loops::simulation_loop::run_simulation_loop(
        state.clone(),
        shutdown_tx.subscribe(),
    ));
    let persist_handle = match (state.database().cloned(), state.take_status_receiver()) {
        (Some(db), Some(rx)) => Some(tokio::spawn(
            loops::status_persist_loop::run_status_persist_loop(
                db,
                state.clone(),
                rx,
                shutdown_tx.subscribe(),
            ),
        )),
        _ => None,
    };

    // Build the app
    let app = api::routes()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(());
    if let Err(err) = sim_handle.await {
        tracing::error!("Simulation loop ended abnormally: {}", err);
    }
    if let Some(handle) = persist_handle {
        if let Err(err) = handle.await {
            tracing::error!("Status persistence loop ended abnormally: {}", err);
        }
    }

    tracing::info!("GMD Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

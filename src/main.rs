//! Kindred Gateway: realtime presence and event delivery.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use kindred_auth::jwt::JwtDecoder;
use kindred_core::config::AppConfig;
use kindred_core::error::AppError;
use kindred_core::traits::ActivityStore;
use kindred_database::{DatabasePool, MemoryActivityStore, PgActivityStore};
use kindred_realtime::RealtimeEngine;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the `KINDRED_ENV` overlay, and environment variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("KINDRED_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Kindred gateway v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Activity store ───────────────────────────────────
    let (store, db_pool): (Arc<dyn ActivityStore>, Option<DatabasePool>) =
        if config.database.url.is_some() {
            let pool = DatabasePool::connect(&config.database).await?;
            let store: Arc<dyn ActivityStore> =
                Arc::new(PgActivityStore::new(pool.pool().clone()));
            (store, Some(pool))
        } else {
            tracing::warn!("database.url not set, using in-memory activity store");
            let store: Arc<dyn ActivityStore> = Arc::new(MemoryActivityStore::new());
            (store, None)
        };

    // ── Step 2: Credential verification ──────────────────────────
    let verifier = Arc::new(JwtDecoder::new(&config.auth));

    // ── Step 3: Realtime engine ──────────────────────────────────
    let engine = RealtimeEngine::new(
        config.realtime.clone(),
        config.presence.clone(),
        verifier,
        store,
    );
    let sweeper_handle = engine.start();

    // ── Step 4: Build and start HTTP server ──────────────────────
    let addr = config.server.bind_address();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let app_state =
        kindred_api::AppState::new(Arc::new(config), engine.clone(), db_pool.clone());
    let app = kindred_api::build_app(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Kindred gateway listening on {}", addr);

    // ── Step 5: Graceful shutdown ────────────────────────────────
    let shutdown_engine = engine.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        shutdown_engine.shutdown();
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 6: Wait for background tasks ────────────────────────
    if tokio::time::timeout(grace, sweeper_handle).await.is_err() {
        tracing::warn!("Presence sweeper did not stop within the grace period");
    }
    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("Kindred gateway shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

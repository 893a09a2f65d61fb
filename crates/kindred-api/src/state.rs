//! Application state shared across all handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use kindred_core::config::AppConfig;
use kindred_database::DatabasePool;
use kindred_realtime::RealtimeEngine;

/// Application state passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Real-time engine owning the gateway
    pub realtime: RealtimeEngine,
    /// PostgreSQL pool, absent when running on the in-memory store
    pub db: Option<DatabasePool>,
    /// When the process started serving
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates state for a freshly started server.
    pub fn new(
        config: Arc<AppConfig>,
        realtime: RealtimeEngine,
        db: Option<DatabasePool>,
    ) -> Self {
        Self {
            config,
            realtime,
            db,
            started_at: Utc::now(),
        }
    }
}

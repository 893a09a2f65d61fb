//! Response DTOs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use kindred_core::types::UserId;
use kindred_realtime::metrics::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
    /// `connected`, `unavailable`, or `disabled` when no database is configured.
    pub database: String,
    /// Open WebSocket transports.
    pub ws_connections: usize,
    /// Users with at least one authenticated connection.
    pub connected_users: usize,
    /// Users currently announced online.
    pub online_users: usize,
    pub metrics: MetricsSnapshot,
}

/// Bulk presence lookup result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceResponse {
    /// Online flag per requested user.
    pub users: HashMap<UserId, bool>,
}

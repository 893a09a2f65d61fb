//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound queue. A connection whose
    /// queue is full when an event is published is treated as dead.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Maximum bound connections per user; the oldest is closed when exceeded.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Accept `?token=` on the upgrade request as an immediate handshake.
    #[serde(default = "default_true")]
    pub allow_query_token: bool,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            max_connections_per_user: default_max_connections_per_user(),
            ping_interval_seconds: default_ping_interval(),
            allow_query_token: true,
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_max_connections_per_user() -> usize {
    5
}

fn default_ping_interval() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

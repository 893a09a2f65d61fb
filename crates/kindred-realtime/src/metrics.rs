//! Gateway metrics counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Gateway-level metrics counters.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    authentications_failed: AtomicU64,
    events_delivered: AtomicU64,
    events_dropped: AtomicU64,
    frames_received: AtomicU64,
    presence_transitions: AtomicU64,
    sweeps: AtomicU64,
    persist_failures: AtomicU64,
}

impl GatewayMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an opened transport
    pub fn record_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed transport
    pub fn record_connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected credential
    pub fn record_auth_failure(&self) {
        self.authentications_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one publish
    pub fn record_delivery(&self, delivered: usize, dropped: usize) {
        self.events_delivered.fetch_add(delivered as u64, Ordering::Relaxed);
        self.events_dropped.fetch_add(dropped as u64, Ordering::Relaxed);
    }

    /// Record a frame read from a client
    pub fn record_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an online/offline transition
    pub fn record_presence_transition(&self) {
        self.presence_transitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed sweep
    pub fn record_sweep(&self) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed last-active write
    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        MetricsSnapshot {
            connections_opened: opened,
            connections_closed: closed,
            connections_active: opened.saturating_sub(closed),
            authentications_failed: self.authentications_failed.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            presence_transitions: self.presence_transitions.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Transports ever opened
    pub connections_opened: u64,
    /// Transports closed
    pub connections_closed: u64,
    /// Currently open transports
    pub connections_active: u64,
    /// Rejected credentials
    pub authentications_failed: u64,
    /// Per-recipient successful enqueues
    pub events_delivered: u64,
    /// Per-recipient drops (dead or full connections)
    pub events_dropped: u64,
    /// Frames read from clients
    pub frames_received: u64,
    /// Online/offline transitions broadcast
    pub presence_transitions: u64,
    /// Inactivity sweeps run
    pub sweeps: u64,
    /// Failed last-active writes
    pub persist_failures: u64,
}

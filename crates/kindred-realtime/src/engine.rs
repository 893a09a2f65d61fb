//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use kindred_core::clock::{Clock, SystemClock};
use kindred_core::config::{PresenceConfig, RealtimeConfig};
use kindred_core::traits::{ActivityStore, CredentialVerifier};

use crate::gateway::Gateway;
use crate::presence::sweeper::PresenceSweeper;

/// Central real-time engine: the gateway plus its background tasks.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Gateway facade.
    pub gateway: Arc<Gateway>,
    /// Realtime settings, read by transports.
    pub config: RealtimeConfig,
    sweep_interval: Duration,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("connections", &self.gateway.connection_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine on the system clock.
    pub fn new(
        realtime: RealtimeConfig,
        presence: PresenceConfig,
        verifier: Arc<dyn CredentialVerifier>,
        store: Arc<dyn ActivityStore>,
    ) -> Self {
        Self::with_clock(realtime, presence, verifier, store, Arc::new(SystemClock))
    }

    /// Creates a new real-time engine on the given clock.
    pub fn with_clock(
        realtime: RealtimeConfig,
        presence: PresenceConfig,
        verifier: Arc<dyn CredentialVerifier>,
        store: Arc<dyn ActivityStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gateway = Arc::new(Gateway::new(&realtime, &presence, verifier, store, clock));
        info!(
            outbound_buffer = realtime.outbound_buffer_size,
            inactivity_threshold_secs = presence.inactivity_threshold_seconds,
            "Real-time engine initialized"
        );
        Self {
            gateway,
            config: realtime,
            sweep_interval: presence.sweep_interval(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Spawns the presence sweeper; it stops on [`RealtimeEngine::shutdown`].
    pub fn start(&self) -> JoinHandle<()> {
        PresenceSweeper::new(self.gateway.presence().clone(), self.sweep_interval)
            .spawn(self.shutdown.child_token())
    }

    /// Token cancelled when the engine shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stops background tasks and closes every connection.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.shutdown.cancel();
        let closed = self.gateway.close_all();
        info!(closed, "Real-time engine shut down");
    }
}

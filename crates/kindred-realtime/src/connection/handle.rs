//! Individual WebSocket connection handle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use kindred_core::types::ConnectionId;

use crate::error::DeliveryFailure;
use crate::message::envelope::Envelope;

/// Receiving half of a connection's outbound queue, drained by the transport.
pub type OutboundReceiver = mpsc::Receiver<Arc<Envelope>>;

/// A handle to a single open transport.
///
/// Holds the bounded sender for pushing envelopes to the client and a
/// cancellation token the transport task watches. Cancelling the token is
/// how the gateway closes a connection it considers dead.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// When the transport was opened
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<Arc<Envelope>>,
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle with an outbound queue of `buffer` envelopes.
    pub fn new(buffer: usize) -> (Self, OutboundReceiver) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let handle = Self {
            id: ConnectionId::new(),
            connected_at: Utc::now(),
            sender,
            closed: CancellationToken::new(),
        };
        (handle, receiver)
    }

    /// Enqueue an envelope without waiting.
    ///
    /// A full queue means the client cannot keep up; the handle is marked
    /// dead so the transport closes and the client reconnects.
    pub fn send(&self, envelope: Arc<Envelope>) -> Result<(), DeliveryFailure> {
        if !self.is_alive() {
            return Err(DeliveryFailure::Closed);
        }
        match self.sender.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(connection_id = %self.id, "Send buffer full, closing connection");
                self.mark_dead();
                Err(DeliveryFailure::BufferFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                Err(DeliveryFailure::Closed)
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        !self.closed.is_cancelled()
    }

    /// Mark connection as dead and signal the transport to close.
    pub fn mark_dead(&self) {
        self.closed.cancel();
    }

    /// Token cancelled once the connection is dead.
    pub fn close_signal(&self) -> CancellationToken {
        self.closed.clone()
    }
}

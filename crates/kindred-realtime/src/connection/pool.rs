//! Connection pool: every open transport, authenticated or not.

use std::sync::Arc;

use dashmap::DashMap;

use kindred_core::types::ConnectionId;

use super::handle::{ConnectionHandle, OutboundReceiver};

/// Thread-safe pool of all open WebSocket connections.
#[derive(Debug)]
pub struct ConnectionPool {
    buffer_size: usize,
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a pool whose connections queue up to `buffer_size` envelopes.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            by_id: DashMap::new(),
        }
    }

    /// Registers a newly opened transport and returns its outbound queue.
    pub fn open(&self) -> (Arc<ConnectionHandle>, OutboundReceiver) {
        let (handle, receiver) = ConnectionHandle::new(self.buffer_size);
        let handle = Arc::new(handle);
        self.by_id.insert(handle.id, handle.clone());
        (handle, receiver)
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.remove(conn_id).map(|(_, handle)| handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// IDs of every open connection, authenticated or not.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.by_id.iter().map(|entry| *entry.key()).collect()
    }

    /// Returns total number of open connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Marks every connection dead so their transports close.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        for entry in self.by_id.iter() {
            entry.value().mark_dead();
            closed += 1;
        }
        closed
    }
}

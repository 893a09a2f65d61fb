//! Connection registry: binds authenticated connections to users.
//!
//! Both directions of the mapping live behind one lock so that
//! `connections_for(u)` contains `c` exactly when `user_for(c) == Some(u)`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use kindred_core::types::{ConnectionId, UserId};

use super::pool::ConnectionPool;
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct Bindings {
    by_connection: HashMap<ConnectionId, UserId>,
    /// Connections per user, oldest first.
    by_user: HashMap<UserId, Vec<ConnectionId>>,
}

impl Bindings {
    fn detach(&mut self, conn_id: ConnectionId, user_id: UserId) {
        if let Some(conns) = self.by_user.get_mut(&user_id) {
            conns.retain(|c| *c != conn_id);
            if conns.is_empty() {
                self.by_user.remove(&user_id);
            }
        }
    }
}

/// Bidirectional connection ↔ user index.
#[derive(Debug)]
pub struct ConnectionRegistry {
    pool: Arc<ConnectionPool>,
    bindings: RwLock<Bindings>,
}

impl ConnectionRegistry {
    /// Creates an empty registry over the given pool.
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            bindings: RwLock::new(Bindings::default()),
        }
    }

    /// Binds an open connection to a user.
    ///
    /// Rebinding to a different user replaces the old binding and returns
    /// the user it belonged to. Binding to the same user again is a no-op.
    pub fn bind(
        &self,
        conn_id: ConnectionId,
        user_id: UserId,
    ) -> Result<Option<UserId>, GatewayError> {
        let mut bindings = self.bindings.write();
        let open = self.pool.get(&conn_id).is_some_and(|h| h.is_alive());
        if !open {
            return Err(GatewayError::UnknownConnection(conn_id));
        }

        let previous = bindings.by_connection.insert(conn_id, user_id);
        match previous {
            Some(prev) if prev == user_id => return Ok(None),
            Some(prev) => bindings.detach(conn_id, prev),
            None => {}
        }
        bindings.by_user.entry(user_id).or_default().push(conn_id);
        Ok(previous)
    }

    /// Removes a connection's binding, returning the user it was bound to.
    pub fn unbind(&self, conn_id: ConnectionId) -> Option<UserId> {
        let mut bindings = self.bindings.write();
        let user_id = bindings.by_connection.remove(&conn_id)?;
        bindings.detach(conn_id, user_id);
        Some(user_id)
    }

    /// All connections currently bound to a user.
    pub fn connections_for(&self, user_id: UserId) -> HashSet<ConnectionId> {
        self.bindings
            .read()
            .by_user
            .get(&user_id)
            .map(|conns| conns.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether the user has at least one bound connection.
    pub fn has_connections(&self, user_id: UserId) -> bool {
        self.bindings.read().by_user.contains_key(&user_id)
    }

    /// The user a connection is bound to, if authenticated.
    pub fn user_for(&self, conn_id: ConnectionId) -> Option<UserId> {
        self.bindings.read().by_connection.get(&conn_id).copied()
    }

    /// Bound connections beyond the newest `keep`, oldest first.
    pub fn excess_connections(&self, user_id: UserId, keep: usize) -> Vec<ConnectionId> {
        let bindings = self.bindings.read();
        match bindings.by_user.get(&user_id) {
            Some(conns) if conns.len() > keep => conns[..conns.len() - keep].to_vec(),
            _ => Vec::new(),
        }
    }

    /// Number of users with at least one binding.
    pub fn user_count(&self) -> usize {
        self.bindings.read().by_user.len()
    }
}

//! Reverse index of which rooms each connection has joined.

use std::collections::HashSet;

use dashmap::DashMap;

use kindred_core::types::ConnectionId;

use super::types::RoomId;

/// Connection → joined rooms.
#[derive(Debug, Default)]
pub struct MembershipIndex {
    rooms_by_conn: DashMap<ConnectionId, HashSet<RoomId>>,
}

impl MembershipIndex {
    /// Records a membership.
    pub fn add(&self, conn_id: ConnectionId, room: RoomId) {
        self.rooms_by_conn.entry(conn_id).or_default().insert(room);
    }

    /// Removes a membership.
    pub fn remove(&self, conn_id: ConnectionId, room: &RoomId) {
        self.rooms_by_conn.remove_if_mut(&conn_id, |_, rooms| {
            rooms.remove(room);
            rooms.is_empty()
        });
    }

    /// Rooms the connection has joined.
    pub fn rooms(&self, conn_id: ConnectionId) -> HashSet<RoomId> {
        self.rooms_by_conn
            .get(&conn_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Forgets the connection, returning the rooms it had joined.
    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<RoomId> {
        self.rooms_by_conn
            .remove(&conn_id)
            .map(|(_, rooms)| rooms)
            .unwrap_or_default()
    }
}

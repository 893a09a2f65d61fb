//! Single room with member tracking.

use std::collections::HashSet;

use kindred_core::types::ConnectionId;

use super::types::RoomId;

/// A room and the connections currently joined to it.
#[derive(Debug, Clone)]
pub struct Room {
    /// Room ID.
    pub id: RoomId,
    members: HashSet<ConnectionId>,
}

impl Room {
    /// Creates a new empty room.
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            members: HashSet::new(),
        }
    }

    /// Adds a member. Returns `false` if it was already present.
    pub fn join(&mut self, conn_id: ConnectionId) -> bool {
        self.members.insert(conn_id)
    }

    /// Removes a member. Returns `false` if it was not present.
    pub fn leave(&mut self, conn_id: ConnectionId) -> bool {
        self.members.remove(&conn_id)
    }

    /// Whether the connection is a member.
    pub fn contains(&self, conn_id: ConnectionId) -> bool {
        self.members.contains(&conn_id)
    }

    /// Iterates over members.
    pub fn members(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.members.iter().copied()
    }

    /// Returns member count.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the room has any members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

//! Room router: room membership and event fan-out.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use kindred_core::types::ConnectionId;

use super::membership::MembershipIndex;
use super::room::Room;
use super::types::RoomId;
use crate::connection::pool::ConnectionPool;
use crate::error::DeliveryFailure;
use crate::message::envelope::Envelope;
use crate::message::types::ServerEvent;
use crate::metrics::GatewayMetrics;

/// Outcome of a single publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Recipients whose queue accepted the event.
    pub delivered: usize,
    /// Recipients that were dead or full and have been removed from every room.
    pub dropped: Vec<ConnectionId>,
}

/// Routes events to the connections joined to a room.
#[derive(Debug)]
pub struct RoomRouter {
    pool: Arc<ConnectionPool>,
    rooms: DashMap<RoomId, Room>,
    memberships: MembershipIndex,
    metrics: Arc<GatewayMetrics>,
}

impl RoomRouter {
    /// Creates a router delivering through the given pool.
    pub fn new(pool: Arc<ConnectionPool>, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            pool,
            rooms: DashMap::new(),
            memberships: MembershipIndex::default(),
            metrics,
        }
    }

    /// Adds a connection to a room, creating the room on first join.
    ///
    /// Returns `false` if the connection was already a member or is not open.
    pub fn join(&self, conn_id: ConnectionId, room: RoomId) -> bool {
        if !self.pool.get(&conn_id).is_some_and(|h| h.is_alive()) {
            return false;
        }
        let joined = self
            .rooms
            .entry(room)
            .or_insert_with(|| Room::new(room))
            .join(conn_id);
        self.memberships.add(conn_id, room);
        joined
    }

    /// Removes a connection from a room; empty rooms are discarded.
    ///
    /// Returns `false` if the connection was not a member.
    pub fn leave(&self, conn_id: ConnectionId, room: RoomId) -> bool {
        let mut left = false;
        self.rooms.remove_if_mut(&room, |_, r| {
            left = r.leave(conn_id);
            r.is_empty()
        });
        self.memberships.remove(conn_id, &room);
        left
    }

    /// Removes a connection from every room it joined.
    pub fn leave_all(&self, conn_id: ConnectionId) -> Vec<RoomId> {
        let rooms = self.memberships.remove_all(conn_id);
        for room in &rooms {
            self.rooms.remove_if_mut(room, |_, r| {
                r.leave(conn_id);
                r.is_empty()
            });
        }
        rooms.into_iter().collect()
    }

    /// Whether the connection has joined the room.
    pub fn is_member(&self, room: &RoomId, conn_id: ConnectionId) -> bool {
        self.rooms.get(room).is_some_and(|r| r.contains(conn_id))
    }

    /// Rooms the connection has joined.
    pub fn rooms_of(&self, conn_id: ConnectionId) -> Vec<RoomId> {
        self.memberships.rooms(conn_id).into_iter().collect()
    }

    /// Number of connections joined to a room.
    pub fn member_count(&self, room: &RoomId) -> usize {
        self.rooms.get(room).map(|r| r.member_count()).unwrap_or(0)
    }

    /// Returns total number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Delivers an event to every member of a room.
    pub fn publish(&self, room: RoomId, event: ServerEvent) -> PublishReport {
        self.fan_out(room, event, None)
    }

    /// Delivers an event to every member of a room except one connection.
    pub fn publish_except(
        &self,
        room: RoomId,
        event: ServerEvent,
        excluded: ConnectionId,
    ) -> PublishReport {
        self.fan_out(room, event, Some(excluded))
    }

    fn fan_out(
        &self,
        room: RoomId,
        event: ServerEvent,
        excluded: Option<ConnectionId>,
    ) -> PublishReport {
        let envelope = Arc::new(Envelope::on_room(event, &room));
        let mut report = PublishReport::default();

        // The shard write guard is held for the whole fan-out: publishes to
        // one room are totally ordered, and a join or leave lands strictly
        // before or after each of them.
        let Some(mut entry) = self.rooms.get_mut(&room) else {
            return report;
        };
        for conn_id in entry.members() {
            if Some(conn_id) == excluded {
                continue;
            }
            match self.pool.get(&conn_id) {
                Some(handle) if handle.send(envelope.clone()).is_ok() => report.delivered += 1,
                _ => report.dropped.push(conn_id),
            }
        }
        for conn_id in &report.dropped {
            entry.leave(*conn_id);
        }
        drop(entry);

        if !report.dropped.is_empty() {
            self.rooms.remove_if(&room, |_, r| r.is_empty());
            for conn_id in &report.dropped {
                debug!(connection_id = %conn_id, room = %room, "Dropping dead room member");
                self.leave_all(*conn_id);
            }
        }
        self.metrics.record_delivery(report.delivered, report.dropped.len());
        report
    }

    /// Delivers one event to every open connection, authenticated or not.
    pub fn broadcast(&self, event: ServerEvent) -> PublishReport {
        let targets = self.pool.ids();
        self.send_to_connections(&targets, event)
    }

    /// Delivers one event to an explicit set of connections, regardless of rooms.
    pub fn send_to_connections(
        &self,
        targets: &[ConnectionId],
        event: ServerEvent,
    ) -> PublishReport {
        let envelope = Arc::new(Envelope::direct(event));
        let mut report = PublishReport::default();
        for conn_id in targets {
            match self.pool.get(conn_id) {
                Some(handle) if handle.send(envelope.clone()).is_ok() => report.delivered += 1,
                _ => report.dropped.push(*conn_id),
            }
        }
        for conn_id in &report.dropped {
            self.leave_all(*conn_id);
        }
        self.metrics.record_delivery(report.delivered, report.dropped.len());
        report
    }

    /// Sends a direct reply to a single connection.
    pub fn send_to(
        &self,
        conn_id: ConnectionId,
        event: ServerEvent,
    ) -> Result<(), DeliveryFailure> {
        let handle = self.pool.get(&conn_id).ok_or(DeliveryFailure::Closed)?;
        let result = handle.send(Arc::new(Envelope::direct(event)));
        match result {
            Ok(()) => self.metrics.record_delivery(1, 0),
            Err(_) => self.metrics.record_delivery(0, 1),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kindred_core::types::{ConversationId, UserId};

    fn router(buffer: usize) -> (Arc<ConnectionPool>, RoomRouter) {
        let pool = Arc::new(ConnectionPool::new(buffer));
        let router = RoomRouter::new(pool.clone(), Arc::new(GatewayMetrics::new()));
        (pool, router)
    }

    fn typing(user_id: UserId, conversation_id: ConversationId) -> ServerEvent {
        ServerEvent::TypingChanged {
            conversation_id,
            user_id,
            is_typing: true,
        }
    }

    #[test]
    fn test_join_is_idempotent() {
        let (pool, router) = router(8);
        let (conn, _rx) = pool.open();
        let room = RoomId::Conversation(ConversationId::new());

        assert!(router.join(conn.id, room));
        assert!(!router.join(conn.id, room));
        assert_eq!(router.member_count(&room), 1);
        assert_eq!(router.rooms_of(conn.id), vec![room]);
    }

    #[test]
    fn test_join_closed_connection_rejected() {
        let (pool, router) = router(8);
        let (conn, _rx) = pool.open();
        conn.mark_dead();
        let room = RoomId::Private(UserId::new());

        assert!(!router.join(conn.id, room));
        assert!(!router.join(ConnectionId::new(), room));
        assert_eq!(router.room_count(), 0);
    }

    #[test]
    fn test_leave_discards_empty_room() {
        let (pool, router) = router(8);
        let (conn, _rx) = pool.open();
        let room = RoomId::Conversation(ConversationId::new());

        router.join(conn.id, room);
        assert!(router.leave(conn.id, room));
        assert!(!router.leave(conn.id, room));
        assert_eq!(router.room_count(), 0);
        assert!(router.rooms_of(conn.id).is_empty());
    }

    #[tokio::test]
    async fn test_publish_reaches_members_only() {
        let (pool, router) = router(8);
        let (member, mut member_rx) = pool.open();
        let (outsider, mut outsider_rx) = pool.open();
        let conversation_id = ConversationId::new();
        let room = RoomId::Conversation(conversation_id);
        router.join(member.id, room);
        router.join(outsider.id, RoomId::Private(UserId::new()));

        let report = router.publish(room, typing(UserId::new(), conversation_id));
        assert_eq!(report.delivered, 1);
        assert!(report.dropped.is_empty());

        let envelope = member_rx.recv().await.unwrap();
        assert_eq!(envelope.room.as_deref(), Some(room.to_string().as_str()));
        assert!(outsider_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_except_skips_sender() {
        let (pool, router) = router(8);
        let (sender, mut sender_rx) = pool.open();
        let (peer, mut peer_rx) = pool.open();
        let conversation_id = ConversationId::new();
        let room = RoomId::Conversation(conversation_id);
        router.join(sender.id, room);
        router.join(peer.id, room);

        let event = typing(UserId::new(), conversation_id);
        let report = router.publish_except(room, event, sender.id);
        assert_eq!(report.delivered, 1);
        assert!(peer_rx.recv().await.is_some());
        assert!(sender_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_member_is_dropped_others_still_served() {
        let (pool, router) = router(1);
        let (slow, _slow_rx) = pool.open();
        let (fast, mut fast_rx) = pool.open();
        let conversation_id = ConversationId::new();
        let room = RoomId::Conversation(conversation_id);
        let private = RoomId::Private(UserId::new());
        router.join(slow.id, room);
        router.join(slow.id, private);
        router.join(fast.id, room);

        let first = router.publish(room, typing(UserId::new(), conversation_id));
        assert_eq!(first.delivered, 2);
        fast_rx.recv().await.unwrap();

        let second = router.publish(room, typing(UserId::new(), conversation_id));
        assert_eq!(second.delivered, 1);
        assert_eq!(second.dropped, vec![slow.id]);
        assert!(fast_rx.recv().await.is_some());

        assert!(!slow.is_alive());
        assert!(!router.is_member(&room, slow.id));
        assert!(!router.is_member(&private, slow.id));
        assert!(router.is_member(&room, fast.id));
    }

    #[tokio::test]
    async fn test_members_missing_from_pool_are_pruned() {
        let (pool, router) = router(8);
        let (gone, _rx) = pool.open();
        let room = RoomId::Private(UserId::new());
        router.join(gone.id, room);
        pool.remove(&gone.id);

        let report = router.publish(
            room,
            ServerEvent::HeartbeatAck {
                timestamp: Utc::now(),
            },
        );
        assert_eq!(report.delivered, 0);
        assert_eq!(report.dropped, vec![gone.id]);
        assert_eq!(router.room_count(), 0);
    }

    #[test]
    fn test_publish_to_unknown_room_is_noop() {
        let (_pool, router) = router(8);
        let report = router.publish(
            RoomId::Conversation(ConversationId::new()),
            ServerEvent::HeartbeatAck {
                timestamp: Utc::now(),
            },
        );
        assert_eq!(report, PublishReport::default());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_connections_outside_rooms() {
        let (pool, router) = router(8);
        let (joined, mut joined_rx) = pool.open();
        let (_bare, mut bare_rx) = pool.open();
        router.join(joined.id, RoomId::Private(UserId::new()));

        let report = router.broadcast(ServerEvent::StatusChanged {
            user_id: UserId::new(),
            is_online: true,
            timestamp: Utc::now(),
        });
        assert_eq!(report.delivered, 2);
        let envelope = bare_rx.recv().await.unwrap();
        assert!(envelope.room.is_none());
        assert!(joined_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_leave_all() {
        let (pool, router) = router(8);
        let (conn, _rx) = pool.open();
        let a = RoomId::Private(UserId::new());
        let b = RoomId::Conversation(ConversationId::new());
        router.join(conn.id, a);
        router.join(conn.id, b);

        let left = router.leave_all(conn.id);
        assert_eq!(left.len(), 2);
        assert!(left.contains(&a) && left.contains(&b));
        assert_eq!(router.room_count(), 0);
    }
}

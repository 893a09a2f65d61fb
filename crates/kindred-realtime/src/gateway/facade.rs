//! The gateway facade: the single entry point for transports and for the
//! CRUD layer pushing events to clients.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use kindred_core::clock::Clock;
use kindred_core::config::{PresenceConfig, RealtimeConfig};
use kindred_core::traits::{ActivityStore, CredentialVerifier};
use kindred_core::types::{ConnectionId, ConversationId, UserId};

use crate::connection::handle::{ConnectionHandle, OutboundReceiver};
use crate::connection::pool::ConnectionPool;
use crate::connection::registry::ConnectionRegistry;
use crate::error::GatewayError;
use crate::message::types::{ChatMessage, Notification, ServerEvent};
use crate::metrics::{GatewayMetrics, MetricsSnapshot};
use crate::presence::status::PresenceStatus;
use crate::presence::tracker::PresenceTracker;
use crate::room::router::{PublishReport, RoomRouter};
use crate::room::types::RoomId;

/// Owns the connection registry, presence tracker, and room router, and
/// sequences every operation across them.
#[derive(Debug)]
pub struct Gateway {
    pool: Arc<ConnectionPool>,
    registry: Arc<ConnectionRegistry>,
    router: Arc<RoomRouter>,
    presence: Arc<PresenceTracker>,
    verifier: Arc<dyn CredentialVerifier>,
    store: Arc<dyn ActivityStore>,
    metrics: Arc<GatewayMetrics>,
    clock: Arc<dyn Clock>,
    max_connections_per_user: usize,
}

impl Gateway {
    /// Build a gateway and its components.
    pub fn new(
        realtime: &RealtimeConfig,
        presence: &PresenceConfig,
        verifier: Arc<dyn CredentialVerifier>,
        store: Arc<dyn ActivityStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let metrics = Arc::new(GatewayMetrics::new());
        let pool = Arc::new(ConnectionPool::new(realtime.outbound_buffer_size));
        let registry = Arc::new(ConnectionRegistry::new(pool.clone()));
        let router = Arc::new(RoomRouter::new(pool.clone(), metrics.clone()));
        let tracker = Arc::new(PresenceTracker::new(
            registry.clone(),
            router.clone(),
            store.clone(),
            clock.clone(),
            presence,
            metrics.clone(),
        ));

        Self {
            pool,
            registry,
            router,
            presence: tracker,
            verifier,
            store,
            metrics,
            clock,
            max_connections_per_user: realtime.max_connections_per_user,
        }
    }

    // ── Connection lifecycle ────────────────────────────────────────

    /// Register a newly accepted transport. The connection starts
    /// unauthenticated and receives nothing but direct replies and
    /// broadcasts until it authenticates.
    pub fn open_connection(&self) -> (Arc<ConnectionHandle>, OutboundReceiver) {
        let (handle, receiver) = self.pool.open();
        self.metrics.record_connection_opened();
        debug!(connection_id = %handle.id, "Connection opened");
        (handle, receiver)
    }

    /// Verify a credential and bind the connection to its user.
    ///
    /// On success the connection joins the user's private room, receives an
    /// `authenticated` reply, and the user is touched (going online if they
    /// were not). On failure the connection stays unauthenticated and open.
    pub async fn authenticate(
        &self,
        conn_id: ConnectionId,
        credential: &str,
    ) -> Result<UserId, GatewayError> {
        if self.pool.get(&conn_id).is_none() {
            return Err(GatewayError::UnknownConnection(conn_id));
        }

        let user_id = match self.verifier.verify(credential).await {
            Ok(user_id) => user_id,
            Err(e) => {
                self.metrics.record_auth_failure();
                warn!(connection_id = %conn_id, error = %e, "Authentication failed");
                return Err(GatewayError::Authentication(e.message));
            }
        };

        if let Some(previous) = self.registry.bind(conn_id, user_id)? {
            // Rooms joined as the previous user no longer apply.
            self.router.leave_all(conn_id);
            self.presence.connection_closed(previous);
        }
        self.router.join(conn_id, RoomId::Private(user_id));
        self.enforce_connection_limit(user_id);

        self.reply(conn_id, ServerEvent::Authenticated { user_id });
        self.presence.touch(user_id);

        info!(connection_id = %conn_id, user_id = %user_id, "Connection authenticated");
        Ok(user_id)
    }

    /// Tear down a connection: leave every room, drop its binding, and take
    /// the user offline if it was their last connection.
    ///
    /// Idempotent; returns the user the connection was bound to.
    pub fn disconnect(&self, conn_id: ConnectionId) -> Option<UserId> {
        let handle = self.pool.remove(&conn_id)?;
        handle.mark_dead();

        self.router.leave_all(conn_id);
        let user_id = self.registry.unbind(conn_id);
        if let Some(user_id) = user_id {
            self.presence.connection_closed(user_id);
        }

        self.metrics.record_connection_closed();
        info!(connection_id = %conn_id, user_id = ?user_id, "Connection closed");
        user_id
    }

    /// Server-initiated close of a connection.
    pub fn kick(&self, conn_id: ConnectionId, reason: &str) -> Option<UserId> {
        info!(connection_id = %conn_id, reason, "Closing connection");
        self.disconnect(conn_id)
    }

    fn enforce_connection_limit(&self, user_id: UserId) {
        let excess = self
            .registry
            .excess_connections(user_id, self.max_connections_per_user);
        for oldest in excess {
            self.kick(oldest, "connection limit reached");
        }
    }

    // ── Conversation membership ─────────────────────────────────────

    /// Join a conversation room the connection's user participates in.
    pub async fn join_conversation(
        &self,
        conn_id: ConnectionId,
        conversation_id: ConversationId,
    ) -> Result<(), GatewayError> {
        let user_id = self.require_user(conn_id)?;
        let room = RoomId::Conversation(conversation_id);

        let members = self
            .store
            .conversation_members(conversation_id)
            .await
            .map_err(GatewayError::Store)?;
        if !members.contains(&user_id) {
            return Err(GatewayError::UnknownRoomTarget {
                room: room.to_string(),
            });
        }

        self.router.join(conn_id, room);
        self.presence.touch(user_id);
        debug!(connection_id = %conn_id, room = %room, "Joined conversation");
        Ok(())
    }

    /// Leave a conversation room. Leaving a room not joined is a no-op.
    pub fn leave_conversation(
        &self,
        conn_id: ConnectionId,
        conversation_id: ConversationId,
    ) -> Result<(), GatewayError> {
        self.require_user(conn_id)?;
        self.router.leave(conn_id, RoomId::Conversation(conversation_id));
        Ok(())
    }

    /// Typing indicator sent by a client over its own connection.
    pub fn typing(
        &self,
        conn_id: ConnectionId,
        conversation_id: ConversationId,
        is_typing: bool,
    ) -> Result<PublishReport, GatewayError> {
        let user_id = self.require_user(conn_id)?;
        let room = RoomId::Conversation(conversation_id);
        if !self.router.is_member(&room, conn_id) {
            return Err(GatewayError::UnknownRoomTarget {
                room: room.to_string(),
            });
        }
        Ok(self.broadcast_typing_status(conversation_id, user_id, is_typing, conn_id))
    }

    /// Client keep-alive; counts as activity.
    pub fn heartbeat(&self, conn_id: ConnectionId) -> Result<DateTime<Utc>, GatewayError> {
        let user_id = self.require_user(conn_id)?;
        self.presence.touch(user_id);
        Ok(self.clock.now())
    }

    // ── Delivery ────────────────────────────────────────────────────

    /// Publish a persisted chat message to its conversation room.
    ///
    /// Counts as activity for the sender.
    pub fn deliver_message(
        &self,
        conversation_id: ConversationId,
        message: ChatMessage,
    ) -> Result<PublishReport, GatewayError> {
        if message.conversation_id != conversation_id {
            return Err(GatewayError::InvalidMessage(format!(
                "message {} belongs to conversation {}, not {conversation_id}",
                message.id, message.conversation_id
            )));
        }
        self.presence.touch(message.sender_id);
        let report = self.router.publish(
            RoomId::Conversation(conversation_id),
            ServerEvent::MessageNew(message),
        );
        self.reap(&report);
        Ok(report)
    }

    /// Publish a notification to every connection of one user.
    ///
    /// A user with no open connection simply receives nothing.
    pub fn deliver_notification(
        &self,
        user_id: UserId,
        notification: Notification,
    ) -> PublishReport {
        let report = self.router.publish(
            RoomId::Private(user_id),
            ServerEvent::NotificationNew(notification),
        );
        self.reap(&report);
        report
    }

    /// Publish a typing indicator to a conversation, skipping the
    /// sender's own connection. Counts as activity for the sender.
    pub fn broadcast_typing_status(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        is_typing: bool,
        sender: ConnectionId,
    ) -> PublishReport {
        self.presence.touch(user_id);
        let report = self.router.publish_except(
            RoomId::Conversation(conversation_id),
            ServerEvent::TypingChanged {
                conversation_id,
                user_id,
                is_typing,
            },
            sender,
        );
        self.reap(&report);
        report
    }

    /// Finish closing connections the router found dead.
    fn reap(&self, report: &PublishReport) {
        for conn_id in &report.dropped {
            self.disconnect(*conn_id);
        }
    }

    // ── Presence reads ──────────────────────────────────────────────

    /// Whether a user is online right now.
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.presence.is_online(user_id)
    }

    /// Online flags for a batch of users.
    pub fn bulk_presence(&self, user_ids: &[UserId]) -> HashMap<UserId, bool> {
        self.presence.bulk_status(user_ids)
    }

    /// Presence record for one user.
    pub fn presence_status(&self, user_id: UserId) -> PresenceStatus {
        self.presence.status(user_id)
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The presence tracker, for the sweeper.
    pub fn presence(&self) -> &Arc<PresenceTracker> {
        &self.presence
    }

    /// The user a connection is bound to.
    pub fn user_for(&self, conn_id: ConnectionId) -> Option<UserId> {
        self.registry.user_for(conn_id)
    }

    /// Connections bound to a user.
    pub fn connections_for(&self, user_id: UserId) -> Vec<ConnectionId> {
        self.registry.connections_for(user_id).into_iter().collect()
    }

    /// Whether a connection has joined a room.
    pub fn is_member(&self, room: &RoomId, conn_id: ConnectionId) -> bool {
        self.router.is_member(room, conn_id)
    }

    /// Number of open transports.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Number of users with a bound connection.
    pub fn connected_user_count(&self) -> usize {
        self.registry.user_count()
    }

    /// Number of users currently announced online.
    pub fn online_count(&self) -> usize {
        self.presence.online_count()
    }

    /// Counters snapshot.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Signal every transport to close.
    pub fn close_all(&self) -> usize {
        self.pool.close_all()
    }

    pub(super) fn record_frame_received(&self) {
        self.metrics.record_frame_received();
    }

    /// Send a direct reply; a failed send has already marked the connection dead.
    pub(super) fn reply(&self, conn_id: ConnectionId, event: ServerEvent) {
        if let Err(failure) = self.router.send_to(conn_id, event) {
            debug!(connection_id = %conn_id, error = %failure, "Reply not delivered");
        }
    }

    fn require_user(&self, conn_id: ConnectionId) -> Result<UserId, GatewayError> {
        self.registry
            .user_for(conn_id)
            .ok_or(GatewayError::NotAuthenticated)
    }
}

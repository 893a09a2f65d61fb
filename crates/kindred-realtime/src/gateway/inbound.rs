//! Dispatch of client frames to gateway operations.

use tracing::debug;

use kindred_core::types::ConnectionId;

use super::facade::Gateway;
use crate::error::GatewayError;
use crate::message::types::{ClientEvent, ServerEvent};

impl Gateway {
    /// Handle one text frame from a client.
    ///
    /// Replies (acks or `error` events) go to the sending connection only.
    pub async fn handle_frame(&self, conn_id: ConnectionId, raw: &str) {
        self.record_frame_received();
        let result = match serde_json::from_str::<ClientEvent>(raw) {
            Ok(event) => self.handle_event(conn_id, event).await,
            Err(e) => Err(GatewayError::InvalidMessage(e.to_string())),
        };

        match result {
            Ok(Some(reply)) => self.reply(conn_id, reply),
            Ok(None) => {}
            Err(err) => {
                debug!(
                    connection_id = %conn_id,
                    code = err.code(),
                    error = %err,
                    "Client request rejected"
                );
                self.reply(conn_id, err.to_event());
            }
        }
    }

    /// Apply a parsed client event, returning the acknowledgement to send.
    pub async fn handle_event(
        &self,
        conn_id: ConnectionId,
        event: ClientEvent,
    ) -> Result<Option<ServerEvent>, GatewayError> {
        match event {
            // `authenticate` sends its own acknowledgement.
            ClientEvent::Authenticate { token } => {
                self.authenticate(conn_id, &token).await?;
                Ok(None)
            }
            ClientEvent::JoinConversation { conversation_id } => {
                self.join_conversation(conn_id, conversation_id).await?;
                Ok(Some(ServerEvent::ConversationJoined { conversation_id }))
            }
            ClientEvent::LeaveConversation { conversation_id } => {
                self.leave_conversation(conn_id, conversation_id)?;
                Ok(Some(ServerEvent::ConversationLeft { conversation_id }))
            }
            ClientEvent::Typing {
                conversation_id,
                is_typing,
            } => {
                self.typing(conn_id, conversation_id, is_typing)?;
                Ok(None)
            }
            ClientEvent::Heartbeat => {
                let timestamp = self.heartbeat(conn_id)?;
                Ok(Some(ServerEvent::HeartbeatAck { timestamp }))
            }
        }
    }
}

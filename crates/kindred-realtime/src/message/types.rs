//! Inbound and outbound WebSocket message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kindred_core::types::{ConversationId, UserId};

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Present a credential to bind the connection to a user.
    Authenticate {
        /// Signed access token.
        token: String,
    },
    /// Join a conversation room the user participates in.
    JoinConversation {
        /// Conversation to join.
        conversation_id: ConversationId,
    },
    /// Leave a conversation room.
    LeaveConversation {
        /// Conversation to leave.
        conversation_id: ConversationId,
    },
    /// Typing indicator for a joined conversation.
    Typing {
        /// Conversation being typed in.
        conversation_id: ConversationId,
        /// Whether the user started or stopped typing.
        is_typing: bool,
    },
    /// Keep-alive that also counts as activity.
    Heartbeat,
}

/// A chat message as persisted by the CRUD layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message ID.
    pub id: Uuid,
    /// Conversation the message belongs to.
    pub conversation_id: ConversationId,
    /// Author.
    pub sender_id: UserId,
    /// Text content.
    pub body: String,
    /// When the message was stored.
    pub sent_at: DateTime<Utc>,
    /// Attachment descriptors, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<serde_json::Value>,
}

/// A notification addressed to a single user (new match, like, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification ID.
    pub id: Uuid,
    /// Category, e.g. `match.new` or `like.received`.
    pub kind: String,
    /// Short title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Extra data for the client to render.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A user went online or offline.
    #[serde(rename = "status.changed")]
    StatusChanged {
        /// User whose status changed.
        user_id: UserId,
        /// New status.
        is_online: bool,
        /// When the transition was observed.
        timestamp: DateTime<Utc>,
    },
    /// New chat message in a joined conversation.
    #[serde(rename = "message.new")]
    MessageNew(ChatMessage),
    /// New notification for this user.
    #[serde(rename = "notification.new")]
    NotificationNew(Notification),
    /// Another participant started or stopped typing.
    #[serde(rename = "typing.changed")]
    TypingChanged {
        /// Conversation being typed in.
        conversation_id: ConversationId,
        /// User typing.
        user_id: UserId,
        /// Whether they are typing.
        is_typing: bool,
    },
    /// The connection is now bound to a user.
    #[serde(rename = "authenticated")]
    Authenticated {
        /// Bound user.
        user_id: UserId,
    },
    /// Conversation room joined.
    #[serde(rename = "conversation.joined")]
    ConversationJoined {
        /// Joined conversation.
        conversation_id: ConversationId,
    },
    /// Conversation room left.
    #[serde(rename = "conversation.left")]
    ConversationLeft {
        /// Left conversation.
        conversation_id: ConversationId,
    },
    /// Reply to a client heartbeat.
    #[serde(rename = "heartbeat.ack")]
    HeartbeatAck {
        /// Server time.
        timestamp: DateTime<Utc>,
    },
    /// A client request failed.
    #[serde(rename = "error")]
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable description.
        message: String,
    },
}

impl ServerEvent {
    /// Wire name of the event, as found in the `type` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => "status.changed",
            Self::MessageNew(_) => "message.new",
            Self::NotificationNew(_) => "notification.new",
            Self::TypingChanged { .. } => "typing.changed",
            Self::Authenticated { .. } => "authenticated",
            Self::ConversationJoined { .. } => "conversation.joined",
            Self::ConversationLeft { .. } => "conversation.left",
            Self::HeartbeatAck { .. } => "heartbeat.ack",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_events() {
        let conversation_id = ConversationId::new();
        let raw = format!(
            r#"{{"type":"typing","conversation_id":"{conversation_id}","is_typing":true}}"#
        );
        let event: ClientEvent = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::Typing {
                conversation_id,
                is_typing: true
            }
        );

        let event: ClientEvent = serde_json::from_str(r#"{"type":"heartbeat"}"#).unwrap();
        assert_eq!(event, ClientEvent::Heartbeat);
    }

    #[test]
    fn test_unknown_client_event_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"subscribe"}"#).is_err());
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"authenticate"}"#).is_err());
    }

    #[test]
    fn test_status_changed_wire_shape() {
        let user_id = UserId::new();
        let event = ServerEvent::StatusChanged {
            user_id,
            is_online: true,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "status.changed");
        assert_eq!(value["user_id"], user_id.to_string());
        assert_eq!(value["is_online"], true);
        assert_eq!(event.name(), "status.changed");
    }

    #[test]
    fn test_message_new_flattens_payload() {
        let message = ChatMessage {
            id: Uuid::new_v4(),
            conversation_id: ConversationId::new(),
            sender_id: UserId::new(),
            body: "hey there".to_string(),
            sent_at: Utc::now(),
            attachments: None,
        };
        let value = serde_json::to_value(ServerEvent::MessageNew(message)).unwrap();
        assert_eq!(value["type"], "message.new");
        assert_eq!(value["body"], "hey there");
        assert!(value.get("attachments").is_none());
    }
}

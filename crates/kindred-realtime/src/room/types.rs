//! Room identifiers.

use std::fmt;
use std::str::FromStr;

use kindred_core::types::{ConversationId, UserId};

use crate::error::GatewayError;

/// Logical destination for published events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomId {
    /// Every connection of one user; targeted by notifications.
    Private(UserId),
    /// Participants of one conversation who have joined it.
    Conversation(ConversationId),
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private(user_id) => write!(f, "user:{user_id}"),
            Self::Conversation(conversation_id) => write!(f, "conversation:{conversation_id}"),
        }
    }
}

impl FromStr for RoomId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GatewayError::InvalidMessage(format!("invalid room name: {s}"));
        let (kind, id) = s.split_once(':').ok_or_else(invalid)?;
        match kind {
            "user" => id.parse().map(Self::Private).map_err(|_| invalid()),
            "conversation" => id.parse().map(Self::Conversation).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let user_id = UserId::new();
        let room = RoomId::Private(user_id);
        assert_eq!(room.to_string(), format!("user:{user_id}"));
        assert_eq!(room.to_string().parse::<RoomId>().unwrap(), room);

        let conversation = RoomId::Conversation(ConversationId::new());
        assert!(conversation.to_string().starts_with("conversation:"));
        assert_eq!(
            conversation.to_string().parse::<RoomId>().unwrap(),
            conversation
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("lobby".parse::<RoomId>().is_err());
        assert!("user:not-a-uuid".parse::<RoomId>().is_err());
        assert!("group:00000000-0000-0000-0000-000000000000".parse::<RoomId>().is_err());
    }
}

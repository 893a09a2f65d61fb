//! Envelope framing every outbound WebSocket message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::ServerEvent;
use crate::room::RoomId;

/// Envelope wrapping an outbound event with delivery metadata.
///
/// One envelope is built per publish and shared by every recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique ID, identical for all recipients of the same publish.
    pub id: Uuid,
    /// Room the event was published to; `None` for direct replies and
    /// presence broadcasts.
    pub room: Option<String>,
    /// The event payload.
    pub data: ServerEvent,
    /// When the envelope was created.
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    fn new(data: ServerEvent, room: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            room,
            data,
            timestamp: Utc::now(),
        }
    }

    /// Envelope for a reply or broadcast that is not tied to a room.
    pub fn direct(data: ServerEvent) -> Self {
        Self::new(data, None)
    }

    /// Envelope for an event published to a room.
    pub fn on_room(data: ServerEvent, room: &RoomId) -> Self {
        Self::new(data, Some(room.to_string()))
    }
}

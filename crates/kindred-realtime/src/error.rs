//! Gateway error taxonomy.
//!
//! [`GatewayError`] values are reported back to the client that caused them.
//! [`DeliveryFailure`] never leaves the router: a failed send marks the
//! recipient dead and delivery to everyone else carries on.

use thiserror::Error;

use kindred_core::error::{AppError, ErrorKind};
use kindred_core::types::ConnectionId;

use crate::message::types::ServerEvent;

/// Errors surfaced to a client as an `error` event.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The credential was rejected; the connection stays unauthenticated.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// The action requires an authenticated connection.
    #[error("connection is not authenticated")]
    NotAuthenticated,
    /// The user is not a participant of the targeted room.
    #[error("not a member of room {room}")]
    UnknownRoomTarget {
        /// Room the client tried to reach.
        room: String,
    },
    /// The connection is not (or no longer) open.
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
    /// The client frame could not be understood.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    /// Conversation membership could not be looked up.
    #[error("store unavailable: {0}")]
    Store(#[source] AppError),
}

impl GatewayError {
    /// Stable machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "AUTHENTICATION_FAILED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::UnknownRoomTarget { .. } => "UNKNOWN_ROOM_TARGET",
            Self::UnknownConnection(_) => "UNKNOWN_CONNECTION",
            Self::InvalidMessage(_) => "INVALID_MESSAGE",
            Self::Store(_) => "STORE_UNAVAILABLE",
        }
    }

    /// The `error` event describing this failure.
    pub fn to_event(&self) -> ServerEvent {
        let message = match self {
            // Store internals stay server-side.
            Self::Store(_) => "membership lookup failed, try again".to_string(),
            other => other.to_string(),
        };
        ServerEvent::Error {
            code: self.code().to_string(),
            message,
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Authentication(msg) => AppError::authentication(msg),
            GatewayError::NotAuthenticated => {
                AppError::authentication("connection is not authenticated")
            }
            GatewayError::UnknownRoomTarget { room } => {
                AppError::authorization(format!("not a member of room {room}"))
            }
            GatewayError::UnknownConnection(id) => {
                AppError::not_found(format!("unknown connection {id}"))
            }
            GatewayError::InvalidMessage(msg) => AppError::validation(msg),
            GatewayError::Store(source) => AppError::with_source(
                ErrorKind::ServiceUnavailable,
                "conversation membership lookup failed",
                source,
            ),
        }
    }
}

/// Why a single connection did not receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryFailure {
    /// The connection's outbound queue was full.
    #[error("outbound buffer full")]
    BufferFull,
    /// The connection's transport is gone.
    #[error("connection closed")]
    Closed,
}

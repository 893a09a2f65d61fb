//! # kindred-realtime
//!
//! Real-time presence and event-delivery gateway for Kindred. Provides:
//!
//! - A connection pool of live transports and a registry binding
//!   connections to authenticated users (several devices per user)
//! - Presence tracking with edge-triggered `status.changed` broadcasts and
//!   an inactivity sweep
//! - A room router delivering events to private and conversation rooms with
//!   per-room ordering and drop-on-full backpressure
//! - The [`Gateway`] facade the rest of the system calls to push chat
//!   messages, notifications, and typing indicators

pub mod connection;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod room;

pub use connection::{ConnectionHandle, ConnectionPool, ConnectionRegistry};
pub use engine::RealtimeEngine;
pub use error::{DeliveryFailure, GatewayError};
pub use gateway::Gateway;
pub use presence::{PresenceSweeper, PresenceTracker};
pub use room::{RoomId, RoomRouter};

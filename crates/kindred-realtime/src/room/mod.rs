//! Room-based event routing.
//!
//! Every authenticated user has a private room (`user:<id>`) joined by all
//! of their connections. Conversation rooms (`conversation:<id>`) are joined
//! explicitly by participants.

pub mod membership;
pub mod room;
pub mod router;
pub mod types;

pub use room::Room;
pub use router::{PublishReport, RoomRouter};
pub use types::RoomId;

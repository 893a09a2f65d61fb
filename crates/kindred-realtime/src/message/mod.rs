//! Wire message definitions.

pub mod envelope;
pub mod types;

pub use envelope::Envelope;
pub use types::{ChatMessage, ClientEvent, Notification, ServerEvent};

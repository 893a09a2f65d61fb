//! User presence: who is online, and the sweep that ages out silent users.

pub mod status;
pub mod sweeper;
pub mod tracker;

pub use status::{PresenceStatus, UserPresence};
pub use sweeper::PresenceSweeper;
pub use tracker::PresenceTracker;

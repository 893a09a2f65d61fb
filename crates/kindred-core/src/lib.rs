//! # kindred-core
//!
//! Core crate for the Kindred real-time gateway. Contains configuration
//! schemas, typed identifiers, the traits through which the gateway talks to
//! its collaborators (credential verification, activity persistence), a
//! swappable clock, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Kindred crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AppError;
pub use result::AppResult;

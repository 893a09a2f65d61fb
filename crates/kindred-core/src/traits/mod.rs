//! Traits the gateway consumes from its collaborators.
//!
//! The gateway never talks to the profile/match store or the login system
//! directly; it goes through these seams so that both can be swapped for
//! in-memory doubles in tests.

pub mod auth;
pub mod store;

pub use auth::CredentialVerifier;
pub use store::ActivityStore;

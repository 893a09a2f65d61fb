//! # kindred-api
//!
//! HTTP layer for the Kindred gateway built on Axum.
//!
//! Exposes the WebSocket upgrade that feeds client frames into the
//! real-time gateway, plus health and presence lookups over HTTP.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;

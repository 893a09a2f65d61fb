//! Gateway facade and client frame dispatch.

pub mod facade;
pub mod inbound;

pub use facade::Gateway;

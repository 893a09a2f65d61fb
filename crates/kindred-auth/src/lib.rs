//! # kindred-auth
//!
//! Credential verification for the real-time gateway. Clients present the
//! access token issued by the HTTP login flow; [`JwtDecoder`] checks it and
//! yields the user id the gateway binds the connection to.
//!
//! ## Modules
//!
//! - `jwt`: claims, token validation, and token minting

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};

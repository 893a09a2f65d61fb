//! # kindred-database
//!
//! Connection management and the two [`ActivityStore`] backends the gateway
//! can run against: PostgreSQL (shared with the CRUD service) and an
//! in-memory map for single-node development and tests.
//!
//! [`ActivityStore`]: kindred_core::traits::ActivityStore

pub mod connection;
pub mod stores;

pub use connection::DatabasePool;
pub use stores::memory::MemoryActivityStore;
pub use stores::postgres::PgActivityStore;

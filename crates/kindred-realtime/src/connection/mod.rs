//! Connection tracking: open transports and their user bindings.

pub mod handle;
pub mod pool;
pub mod registry;

pub use handle::{ConnectionHandle, OutboundReceiver};
pub use pool::ConnectionPool;
pub use registry::ConnectionRegistry;

//! [`ActivityStore`](kindred_core::traits::ActivityStore) backends.

pub mod memory;
pub mod postgres;

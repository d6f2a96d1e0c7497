//! Shared identifier types used across the order fulfillment system.

pub mod types;

pub use types::{EventId, OrderId};

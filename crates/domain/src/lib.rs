//! Domain layer for the order fulfillment system.
//!
//! Owns the order aggregate and its status state machine, plus the
//! key-value store boundary (`OrderStore`) consulted by the reservation
//! coordinator and the compensation handler. Status transitions happen
//! only through the aggregate's methods so that every order reaches
//! exactly one terminal status.

pub mod order;
pub mod value_objects;

pub use order::status::OrderStatus;
pub use order::store::{InMemoryOrderStore, OrderStore, StoreError};
pub use order::{Order, OrderError};
pub use value_objects::{CustomerId, LineItem, Money, ProductId};

//! Inventory-reservation saga.
//!
//! Coordinates all-or-nothing multi-item stock reservation without a
//! distributed transaction. The reservation coordinator consumes order
//! submissions, drives each order through `Pending → Reserving →
//! Reserved | Failed`, and compensates partial work in reverse order
//! when any item cannot be reserved. The compensation handler consumes
//! payment outcomes: success confirms the order, failure releases the
//! reserved stock and cancels it. Both paths are idempotent under
//! at-least-once redelivery.

pub mod attempt;
pub mod compensation;
pub mod coordinator;
pub mod error;

pub use attempt::{ItemOutcome, ReservationAttempt};
pub use compensation::CompensationHandler;
pub use coordinator::ReservationCoordinator;
pub use error::SagaError;

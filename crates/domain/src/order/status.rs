//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its reservation lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──► Reserving ──┬──► Reserved ──┬──► Confirmed
///                         │               └──► Cancelled
///                         └──► Failed
/// ```
///
/// The reservation coordinator owns `Pending → Reserving → Reserved | Failed`;
/// the compensation handler owns `Reserved → Confirmed | Cancelled` based on
/// the payment outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order has been submitted, reservation has not started.
    #[default]
    Pending,

    /// Reservation pass is in progress.
    Reserving,

    /// All line items reserved, awaiting payment outcome.
    Reserved,

    /// Reservation failed; any partial work was compensated (terminal).
    Failed,

    /// Payment succeeded; reserved stock is permanently consumed (terminal).
    Confirmed,

    /// Payment failed; reserved stock was released (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if a reservation pass may start from this status.
    pub fn can_start_reservation(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if an interrupted reservation pass may be re-entered.
    pub fn can_resume_reservation(&self) -> bool {
        matches!(self, OrderStatus::Reserving)
    }

    /// Returns true if the reservation side of the saga has settled,
    /// one way or the other.
    pub fn reservation_settled(&self) -> bool {
        !matches!(self, OrderStatus::Pending | OrderStatus::Reserving)
    }

    /// Returns true if the order can be confirmed on payment success.
    pub fn can_confirm(&self) -> bool {
        matches!(self, OrderStatus::Reserved)
    }

    /// Returns true if the order can be cancelled on payment failure.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Reserved)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Failed | OrderStatus::Confirmed | OrderStatus::Cancelled
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Reserving => "Reserving",
            OrderStatus::Reserved => "Reserved",
            OrderStatus::Failed => "Failed",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_pending_can_start_reservation() {
        assert!(OrderStatus::Pending.can_start_reservation());
        assert!(!OrderStatus::Reserving.can_start_reservation());
        assert!(!OrderStatus::Reserved.can_start_reservation());
        assert!(!OrderStatus::Failed.can_start_reservation());
        assert!(!OrderStatus::Confirmed.can_start_reservation());
        assert!(!OrderStatus::Cancelled.can_start_reservation());
    }

    #[test]
    fn test_reserving_can_resume() {
        assert!(!OrderStatus::Pending.can_resume_reservation());
        assert!(OrderStatus::Reserving.can_resume_reservation());
        assert!(!OrderStatus::Reserved.can_resume_reservation());
    }

    #[test]
    fn test_reservation_settled() {
        assert!(!OrderStatus::Pending.reservation_settled());
        assert!(!OrderStatus::Reserving.reservation_settled());
        assert!(OrderStatus::Reserved.reservation_settled());
        assert!(OrderStatus::Failed.reservation_settled());
        assert!(OrderStatus::Confirmed.reservation_settled());
        assert!(OrderStatus::Cancelled.reservation_settled());
    }

    #[test]
    fn test_reserved_can_confirm_and_cancel() {
        assert!(OrderStatus::Reserved.can_confirm());
        assert!(OrderStatus::Reserved.can_cancel());
        for status in [
            OrderStatus::Pending,
            OrderStatus::Reserving,
            OrderStatus::Failed,
            OrderStatus::Confirmed,
            OrderStatus::Cancelled,
        ] {
            assert!(!status.can_confirm(), "{status} should not confirm");
            assert!(!status.can_cancel(), "{status} should not cancel");
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Reserving.is_terminal());
        assert!(!OrderStatus::Reserved.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(OrderStatus::Confirmed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderStatus::Pending.to_string(), "Pending");
        assert_eq!(OrderStatus::Reserving.to_string(), "Reserving");
        assert_eq!(OrderStatus::Reserved.to_string(), "Reserved");
        assert_eq!(OrderStatus::Failed.to_string(), "Failed");
        assert_eq!(OrderStatus::Confirmed.to_string(), "Confirmed");
        assert_eq!(OrderStatus::Cancelled.to_string(), "Cancelled");
    }

    #[test]
    fn test_serialization() {
        let status = OrderStatus::Reserving;
        let json = serde_json::to_string(&status).unwrap();
        let deserialized: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
    }
}

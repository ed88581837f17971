//! Error types for ticket purchases.

use thiserror::Error;

/// Failure raised by a payment or seat reservation port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected: {reason}")]
    Rejected { reason: String },
}

/// Error returned by [`TicketService::purchase_tickets`](super::TicketService::purchase_tickets).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("invalid account id")]
    InvalidAccount,

    #[error("only a maximum of {max} tickets can be purchased at a time")]
    TooManyTickets { max: u32 },

    #[error("child and infant tickets cannot be purchased without an adult ticket")]
    AdultRequired,

    #[error("payment unexpected error: {0}")]
    PaymentFailed(#[source] ServiceError),

    #[error("seat reservation unexpected error: {0}")]
    ReservationFailed(#[source] ServiceError),
}

impl PurchaseError {
    /// True for purchase rule violations the caller can fix by changing the
    /// request; false for port failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            PurchaseError::PaymentFailed(_) | PurchaseError::ReservationFailed(_)
        )
    }
}

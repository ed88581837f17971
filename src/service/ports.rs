//! External collaborators the purchase flow calls into.

use tracing::info;

use crate::Amount;
use crate::model::AccountId;

use super::ServiceError;

/// Takes payment for a purchase.
pub trait TicketPaymentService: Send + Sync {
    /// Charge `amount` to `account`. Blocks until the charge is settled or fails.
    ///
    /// # Errors
    ///
    /// Any failure of the payment provider, reported as a [`ServiceError`].
    fn make_payment(&self, account: AccountId, amount: Amount) -> Result<(), ServiceError>;
}

/// Reserves seats for a purchase.
pub trait SeatReservationService: Send + Sync {
    /// Reserve `seats` seats for `account`.
    ///
    /// # Errors
    ///
    /// Any failure of the reservation provider, reported as a [`ServiceError`].
    fn reserve_seat(&self, account: AccountId, seats: u32) -> Result<(), ServiceError>;
}

impl<T: TicketPaymentService + ?Sized> TicketPaymentService for &T {
    fn make_payment(&self, account: AccountId, amount: Amount) -> Result<(), ServiceError> {
        (**self).make_payment(account, amount)
    }
}

impl<T: SeatReservationService + ?Sized> SeatReservationService for &T {
    fn reserve_seat(&self, account: AccountId, seats: u32) -> Result<(), ServiceError> {
        (**self).reserve_seat(account, seats)
    }
}

/// Payment port that accepts every charge and logs it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPaymentService;

impl TicketPaymentService for LoggingPaymentService {
    fn make_payment(&self, account: AccountId, amount: Amount) -> Result<(), ServiceError> {
        info!(account, amount = %amount, "payment taken");
        Ok(())
    }
}

/// Seat reservation port that accepts every reservation and logs it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSeatReservationService;

impl SeatReservationService for LoggingSeatReservationService {
    fn reserve_seat(&self, account: AccountId, seats: u32) -> Result<(), ServiceError> {
        info!(account, seats, "seats reserved");
        Ok(())
    }
}

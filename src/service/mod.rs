//! Ticket purchase processing.
//!
//! The service validates a purchase, totals its cost and seats, then hands
//! payment and seat reservation to the external ports.
//! Also supports processing an async stream of orders.

use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::model::{AccountId, Order, OrderId, TicketTypeRequest};
use crate::pricing::PurchaseRules;

mod state;
pub use state::Purchase;

mod error;
pub use error::{PurchaseError, ServiceError};

mod ports;
pub use ports::{
    LoggingPaymentService, LoggingSeatReservationService, SeatReservationService,
    TicketPaymentService,
};

/// Result of processing one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub order: OrderId,
    pub account: Option<AccountId>,
    pub result: Result<Purchase, PurchaseError>,
}

/// The ticket purchase service.
///
/// Holds no per-purchase state, so one instance can serve concurrent callers.
pub struct TicketService<P, S> {
    payments: P,
    seats: S,
    rules: PurchaseRules,
}

/// Public API
impl<P, S> TicketService<P, S>
where
    P: TicketPaymentService,
    S: SeatReservationService,
{
    pub fn new(payments: P, seats: S) -> Self {
        Self::with_rules(payments, seats, PurchaseRules::default())
    }

    pub fn with_rules(payments: P, seats: S, rules: PurchaseRules) -> Self {
        Self {
            payments,
            seats,
            rules,
        }
    }

    pub fn rules(&self) -> &PurchaseRules {
        &self.rules
    }

    /// Purchase tickets for an account:
    /// - An empty request list succeeds without touching anything
    /// - Ensure the account id is present and positive
    /// - Total tickets, seats and cost, bailing out past the ticket limit
    /// - Ensure at least one adult is present
    /// - Take payment, then reserve seats
    ///
    /// A successful payment is not refunded if the reservation fails.
    pub fn purchase_tickets(
        &self,
        account: Option<AccountId>,
        requests: &[TicketTypeRequest],
    ) -> Result<Purchase, PurchaseError> {
        if requests.is_empty() {
            return Ok(Purchase::default());
        }

        let account = account
            .filter(|id| *id > 0)
            .ok_or(PurchaseError::InvalidAccount)?;

        let mut purchase = Purchase::default();
        for request in requests {
            purchase.add(request, &self.rules)?;
        }

        if purchase.is_empty() {
            return Ok(purchase);
        }

        if !purchase.has_adult() {
            return Err(PurchaseError::AdultRequired);
        }

        self.take_payment(account, &purchase)?;
        self.reserve_seats(account, &purchase)?;

        Ok(purchase)
    }

    /// Purchase the tickets of a single order and log the outcome.
    pub fn process(&self, order: &Order) -> Outcome {
        let result = self.purchase_tickets(order.account, &order.requests);
        Self::log_result(order, &result);
        Outcome {
            order: order.id,
            account: order.account,
            result,
        }
    }

    /// Process every order of the stream, in arrival order.
    pub async fn run(&self, mut stream: impl Stream<Item = Order> + Unpin) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Some(order) = stream.next().await {
            // a failed order never stops the batch
            outcomes.push(self.process(&order));
        }
        outcomes
    }
}

/// Private API
impl<P, S> TicketService<P, S>
where
    P: TicketPaymentService,
    S: SeatReservationService,
{
    fn log_result(order: &Order, result: &Result<Purchase, PurchaseError>) {
        // a missing account leaves the field out
        let account = order.account;
        match result {
            Ok(purchase) => {
                info!(
                    order = order.id,
                    account,
                    tickets = purchase.total_tickets,
                    seats = purchase.seats_to_allocate,
                    amount = %purchase.amount_due,
                    "purchase applied"
                );
            }
            Err(e) => {
                info!(
                    order = order.id,
                    account,
                    reason = %e,
                    "purchase skipped"
                );
            }
        }
    }

    /// Charge the account, unless there is nothing to pay
    fn take_payment(&self, account: AccountId, purchase: &Purchase) -> Result<(), PurchaseError> {
        if purchase.amount_due.is_zero() {
            return Ok(());
        }
        debug!(account, amount = %purchase.amount_due, "taking payment");
        self.payments
            .make_payment(account, purchase.amount_due)
            .map_err(PurchaseError::PaymentFailed)
    }

    /// Reserve seats, unless only infants were bought
    fn reserve_seats(&self, account: AccountId, purchase: &Purchase) -> Result<(), PurchaseError> {
        if purchase.seats_to_allocate == 0 {
            return Ok(());
        }
        debug!(account, seats = purchase.seats_to_allocate, "reserving seats");
        self.seats
            .reserve_seat(account, purchase.seats_to_allocate)
            .map_err(|e| {
                if !purchase.amount_due.is_zero() {
                    warn!(
                        account,
                        amount = %purchase.amount_due,
                        "seat reservation failed after payment was taken"
                    );
                }
                PurchaseError::ReservationFailed(e)
            })
    }
}

impl Default for TicketService<LoggingPaymentService, LoggingSeatReservationService> {
    fn default() -> Self {
        Self::new(LoggingPaymentService, LoggingSeatReservationService)
    }
}

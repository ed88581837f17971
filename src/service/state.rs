use crate::Amount;
use crate::model::{TicketType, TicketTypeRequest};
use crate::pricing::PurchaseRules;

use super::PurchaseError;

/// Running totals of a single purchase.
/// Built from zero on every call and handed back to the caller on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Purchase {
    pub total_tickets: u32,
    pub seats_to_allocate: u32,
    pub amount_due: Amount,
    pub adults: u32,
}

impl Purchase {
    /// Fold one request into the totals.
    ///
    /// Fails as soon as the ticket count goes over `rules.max_tickets`; the
    /// offending request then contributes nothing else.
    pub fn add(
        &mut self,
        request: &TicketTypeRequest,
        rules: &PurchaseRules,
    ) -> Result<(), PurchaseError> {
        let quantity = request.quantity();
        let ticket_type = request.ticket_type();

        self.total_tickets = self.total_tickets.saturating_add(quantity);
        if self.total_tickets > rules.max_tickets {
            return Err(PurchaseError::TooManyTickets {
                max: rules.max_tickets,
            });
        }

        if ticket_type.occupies_seat() {
            self.seats_to_allocate = self.seats_to_allocate.saturating_add(quantity);
            self.amount_due += rules.prices.price(ticket_type) * quantity;
            if ticket_type == TicketType::Adult {
                self.adults = self.adults.saturating_add(quantity);
            }
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.total_tickets == 0
    }

    pub fn has_adult(&self) -> bool {
        self.adults > 0
    }
}

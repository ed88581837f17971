//! Ticket prices and purchase limits.

use crate::Amount;
use crate::model::TicketType;

/// Most tickets a single purchase may contain.
pub const MAX_TICKETS: u32 = 20;

/// Unit price per ticket type. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceTable {
    adult: Amount,
    child: Amount,
    infant: Amount,
}

impl PriceTable {
    /// Adult 20, child 10, infant free.
    pub const STANDARD: PriceTable =
        PriceTable::new(Amount::new(20), Amount::new(10), Amount::ZERO);

    pub const fn new(adult: Amount, child: Amount, infant: Amount) -> Self {
        Self {
            adult,
            child,
            infant,
        }
    }

    pub fn price(&self, ticket_type: TicketType) -> Amount {
        match ticket_type {
            TicketType::Adult => self.adult,
            TicketType::Child => self.child,
            TicketType::Infant => self.infant,
        }
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Unit price of `ticket_type` in the standard table.
pub fn unit_price(ticket_type: TicketType) -> Amount {
    PriceTable::STANDARD.price(ticket_type)
}

/// Limits and prices applied to every purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseRules {
    pub max_tickets: u32,
    pub prices: PriceTable,
}

impl Default for PurchaseRules {
    fn default() -> Self {
        Self {
            max_tickets: MAX_TICKETS,
            prices: PriceTable::STANDARD,
        }
    }
}

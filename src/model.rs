//! Core domain types for ticket purchases.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Account identifier. Only strictly positive values are valid.
pub type AccountId = i64;

/// Identifier of an order in a batch file.
pub type OrderId = u32;

/// Category of ticket, deciding price and seat occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketType {
    Adult,
    Child,
    /// Sits on an adult's lap: no seat, no charge.
    Infant,
}

impl TicketType {
    pub const ALL: [TicketType; 3] = [TicketType::Adult, TicketType::Child, TicketType::Infant];

    /// Whether a ticket of this type takes a seat.
    pub fn occupies_seat(self) -> bool {
        self != TicketType::Infant
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TicketType::Adult => "adult",
            TicketType::Child => "child",
            TicketType::Infant => "infant",
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known ticket type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ticket type '{0}'")]
pub struct UnknownTicketType(pub String);

impl FromStr for TicketType {
    type Err = UnknownTicketType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TicketType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownTicketType(s.to_string()))
    }
}

/// A request for `quantity` tickets of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketTypeRequest {
    ticket_type: TicketType,
    quantity: u32,
}

impl TicketTypeRequest {
    pub fn new(ticket_type: TicketType, quantity: u32) -> Self {
        Self {
            ticket_type,
            quantity,
        }
    }

    pub fn ticket_type(&self) -> TicketType {
        self.ticket_type
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// One purchase read from a batch: the account placing it and its requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    /// `None` when the batch row left the account empty.
    pub account: Option<AccountId>,
    pub requests: Vec<TicketTypeRequest>,
}

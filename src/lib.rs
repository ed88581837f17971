pub mod amount;
pub mod csv;
pub mod model;
pub mod pricing;
pub mod service;

pub use amount::Amount;
pub use model::{AccountId, Order, OrderId, TicketType, TicketTypeRequest};
pub use pricing::{PriceTable, PurchaseRules, unit_price};
pub use service::{Outcome, Purchase, PurchaseError, TicketService};

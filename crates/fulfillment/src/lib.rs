//! Order fulfillment across the stock ledger and the order store.
//!
//! A fulfillment takes stock for every requested SKU and records the order as
//! one all-or-nothing operation:
//! 1. Validate the request and resolve every SKU
//! 2. Decrement each SKU in ascending SKU order
//! 3. Insert the order
//!
//! If a decrement or the order insert fails, the decrements already applied
//! are reversed in the opposite order before the failure is returned.

pub mod attempt;
pub mod coordinator;
pub mod error;
pub mod request;
pub mod state;

pub use attempt::{FulfillmentAttempt, Reservation};
pub use coordinator::FulfillmentCoordinator;
pub use error::{FulfillmentError, Result};
pub use request::{FulfillmentRequest, LineItemRequest, ReservationLine, ValidatedRequest};
pub use state::FulfillmentState;

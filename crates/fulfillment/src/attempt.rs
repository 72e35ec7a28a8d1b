//! Bookkeeping for one fulfillment attempt.

use common::RecordId;
use domain::{OrderLineItem, Sku};

use crate::error::{FulfillmentError, Result};
use crate::state::FulfillmentState;

/// Stock taken for one SKU during an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub item_id: RecordId,
    pub sku: Sku,
    pub quantity: u32,
}

/// Tracks the state and the applied reservations of a single attempt, so
/// that a failure knows exactly what to undo.
#[derive(Debug, Clone)]
pub struct FulfillmentAttempt {
    order_number: String,
    state: FulfillmentState,
    reservations: Vec<Reservation>,
    history: Vec<FulfillmentState>,
}

impl FulfillmentAttempt {
    pub fn new(order_number: impl Into<String>) -> Self {
        let state = FulfillmentState::default();
        Self {
            order_number: order_number.into(),
            state,
            reservations: Vec::new(),
            history: vec![state],
        }
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn state(&self) -> FulfillmentState {
        self.state
    }

    /// Every state the attempt has been in, oldest first.
    pub fn history(&self) -> &[FulfillmentState] {
        &self.history
    }

    /// Reservations applied so far, in the order they were taken.
    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    /// Moves to `next`, or fails with `Internal` if the step is illegal.
    pub fn transition(&mut self, next: FulfillmentState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(FulfillmentError::Internal(format!(
                "illegal fulfillment transition {} -> {} for order {}",
                self.state, next, self.order_number
            )));
        }
        tracing::trace!(order_number = %self.order_number, from = %self.state, to = %next, "fulfillment transition");
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Records stock taken for the line currently being reserved.
    pub fn record_reservation(&mut self, reservation: Reservation) -> Result<()> {
        match self.state {
            FulfillmentState::Reserving(i) if i == self.reservations.len() => {
                self.reservations.push(reservation);
                Ok(())
            }
            state => Err(FulfillmentError::Internal(format!(
                "reservation for {} recorded in state {state}",
                reservation.sku
            ))),
        }
    }

    /// Line items for the order, one per reservation.
    pub fn line_items(&self) -> Vec<OrderLineItem> {
        self.reservations
            .iter()
            .map(|r| OrderLineItem::new(r.item_id, r.sku.clone(), r.quantity))
            .collect()
    }
}

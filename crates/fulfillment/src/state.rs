//! Fulfillment state machine.

use serde::{Deserialize, Serialize};

/// Where a single fulfillment attempt is in its lifecycle.
///
/// State transitions:
/// ```text
/// Validating ──► Reserving(0) ──► .. ──► Reserving(n-1) ──► Persisting ──► Committed
///     │                │                                       │
///     │                └──────────► Compensating ◄─────────────┘
///     │                                  │
///     └──────────────────────────────────┴──► Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FulfillmentState {
    /// Checking the request and resolving SKUs. Nothing has been written.
    #[default]
    Validating,

    /// Taking stock for the line at this index (in reservation order).
    Reserving(usize),

    /// All stock taken, inserting the order.
    Persisting,

    /// Restoring the stock taken so far.
    Compensating,

    /// Stock taken and order recorded (terminal state).
    Committed,

    /// Nothing left applied, or compensation gave up (terminal state).
    Aborted,
}

impl FulfillmentState {
    /// Returns true if moving from `self` to `next` is a legal step.
    pub fn can_transition_to(&self, next: FulfillmentState) -> bool {
        use FulfillmentState::*;
        match (*self, next) {
            (Validating, Reserving(0)) => true,
            (Reserving(i), Reserving(j)) => j == i + 1,
            (Reserving(_), Persisting) => true,
            (Persisting, Committed) => true,
            (Reserving(_) | Persisting, Compensating) => true,
            (Validating | Compensating, Aborted) => true,
            _ => false,
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FulfillmentState::Committed | FulfillmentState::Aborted)
    }

    /// Returns the state name without the line index.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentState::Validating => "Validating",
            FulfillmentState::Reserving(_) => "Reserving",
            FulfillmentState::Persisting => "Persisting",
            FulfillmentState::Compensating => "Compensating",
            FulfillmentState::Committed => "Committed",
            FulfillmentState::Aborted => "Aborted",
        }
    }
}

impl std::fmt::Display for FulfillmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentState::Reserving(i) => write!(f, "Reserving({i})"),
            other => f.write_str(other.as_str()),
        }
    }
}

//! Order lifecycle status.
//!
//! The lifecycle is linear with branches and no re-entry:
//!
//! ```text
//! pending -> draft_created -> paid -> (paid_pending_fulfillment) -> processing -> shipped -> delivered
//!               |
//!               +-> cancelled | partially_cancelled        (abandonment sweeper)
//!
//! paid / paid_pending_fulfillment / processing -> refunded
//! ```
//!
//! Webhook delivery is unordered, so consumers guard every transition with
//! [`OrderStatus::can_transition`] and drop stale events.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Local order record exists; no remote side effects yet.
    #[default]
    Pending,
    /// Draft fulfillment orders and the payment session exist remotely.
    DraftCreated,
    /// Payment confirmed by the payment provider.
    Paid,
    /// Paid, but at least one draft could not be confirmed for production.
    PaidPendingFulfillment,
    /// All fulfillment orders confirmed and in production.
    Processing,
    /// At least one shipment is on its way.
    Shipped,
    /// All shipments delivered.
    Delivered,
    /// Every recorded draft was cancelled by the sweeper.
    Cancelled,
    /// Some, but not all, drafts were cancelled by the sweeper.
    PartiallyCancelled,
    /// Payment was returned to the customer.
    Refunded,
}

impl OrderStatus {
    /// Whether moving from `self` to `to` is a legal lifecycle step.
    ///
    /// Transitions only move forward; a status never re-enters an earlier
    /// one. `Refunded` is reachable from any paid or in-production state.
    #[must_use]
    pub fn can_transition(self, to: Self) -> bool {
        use OrderStatus::{
            Cancelled, Delivered, DraftCreated, Paid, PaidPendingFulfillment,
            PartiallyCancelled, Pending, Processing, Refunded, Shipped,
        };

        matches!(
            (self, to),
            (Pending, DraftCreated)
                | (DraftCreated, Paid | Cancelled | PartiallyCancelled)
                | (Paid, PaidPendingFulfillment | Processing | Refunded)
                | (PaidPendingFulfillment, Processing | Refunded)
                | (Processing, Shipped | Refunded)
                | (Shipped, Delivered)
        )
    }

    /// Whether this status is a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::Cancelled | Self::PartiallyCancelled | Self::Refunded
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::DraftCreated => "draft_created",
            Self::Paid => "paid",
            Self::PaidPendingFulfillment => "paid_pending_fulfillment",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::PartiallyCancelled => "partially_cancelled",
            Self::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "draft_created" => Ok(Self::DraftCreated),
            "paid" => Ok(Self::Paid),
            "paid_pending_fulfillment" => Ok(Self::PaidPendingFulfillment),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "partially_cancelled" => Ok(Self::PartiallyCancelled),
            "refunded" => Ok(Self::Refunded),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_allowed() {
        assert!(OrderStatus::Pending.can_transition(OrderStatus::DraftCreated));
        assert!(OrderStatus::DraftCreated.can_transition(OrderStatus::Paid));
        assert!(OrderStatus::DraftCreated.can_transition(OrderStatus::Cancelled));
        assert!(OrderStatus::DraftCreated.can_transition(OrderStatus::PartiallyCancelled));
        assert!(OrderStatus::Paid.can_transition(OrderStatus::Processing));
        assert!(OrderStatus::Paid.can_transition(OrderStatus::PaidPendingFulfillment));
        assert!(OrderStatus::PaidPendingFulfillment.can_transition(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition(OrderStatus::Delivered));
        assert!(OrderStatus::Processing.can_transition(OrderStatus::Refunded));
    }

    #[test]
    fn no_re_entry() {
        assert!(!OrderStatus::Paid.can_transition(OrderStatus::DraftCreated));
        assert!(!OrderStatus::Shipped.can_transition(OrderStatus::Processing));
        assert!(!OrderStatus::Delivered.can_transition(OrderStatus::Shipped));
        assert!(!OrderStatus::Cancelled.can_transition(OrderStatus::Paid));
    }

    #[test]
    fn pending_cannot_be_cancelled_by_sweeper() {
        // The sweeper only handles draft_created orders.
        assert!(!OrderStatus::Pending.can_transition(OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }

    #[test]
    fn display_and_from_str_round_trip() {
        let all = [
            OrderStatus::Pending,
            OrderStatus::DraftCreated,
            OrderStatus::Paid,
            OrderStatus::PaidPendingFulfillment,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::PartiallyCancelled,
            OrderStatus::Refunded,
        ];
        for status in all {
            let parsed: OrderStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("unknown".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PartiallyCancelled).unwrap();
        assert_eq!(json, "\"partially_cancelled\"");
    }
}

//! Order fulfillment status.
//!
//! ```text
//! CREATED ──► PAYMENT_RECEIVED ──► VERIFIED ──► SHIPPED ──► RECEIVED
//!    │               │                 │
//!    └───────────────┴─────────────────┴──► CANCELLED | REJECTED
//! ```
//!
//! The diagram is the regular flow. Status updates are not rejected when they
//! leave it: the order service writes whatever status it is given and only
//! reports irregular moves (see [`OrderStatus::can_advance_to`]).

use serde::{Deserialize, Serialize};

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed, awaiting payment.
    #[default]
    Created,
    /// Payment has been received; stamps the order's payment date.
    PaymentReceived,
    /// Payment verified by the shop.
    Verified,
    /// Handed to the carrier; stamps the order's delivered date.
    Shipped,
    /// Buyer confirmed receipt.
    Received,
    /// Cancelled by the buyer or the shop.
    Cancelled,
    /// Rejected by the shop (e.g. failed verification).
    Rejected,
}

impl OrderStatus {
    /// Every status, in flow order.
    pub const ALL: [Self; 7] = [
        Self::Created,
        Self::PaymentReceived,
        Self::Verified,
        Self::Shipped,
        Self::Received,
        Self::Cancelled,
        Self::Rejected,
    ];

    /// Wire/database label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::PaymentReceived => "PAYMENT_RECEIVED",
            Self::Verified => "VERIFIED",
            Self::Shipped => "SHIPPED",
            Self::Received => "RECEIVED",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether moving to this status records the payment date.
    #[must_use]
    pub const fn stamps_payment(&self) -> bool {
        matches!(self, Self::PaymentReceived)
    }

    /// Whether moving to this status records the delivered date.
    #[must_use]
    pub const fn stamps_delivery(&self) -> bool {
        matches!(self, Self::Shipped)
    }

    /// Whether `next` is a regular successor of this status.
    ///
    /// Staying in the same status is not an advance.
    #[must_use]
    pub const fn can_advance_to(&self, next: Self) -> bool {
        match self {
            Self::Created => matches!(
                next,
                Self::PaymentReceived | Self::Cancelled | Self::Rejected
            ),
            Self::PaymentReceived => matches!(
                next,
                Self::Verified | Self::Shipped | Self::Cancelled | Self::Rejected
            ),
            Self::Verified => matches!(next, Self::Shipped | Self::Cancelled | Self::Rejected),
            Self::Shipped => matches!(next, Self::Received),
            Self::Received | Self::Cancelled | Self::Rejected => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

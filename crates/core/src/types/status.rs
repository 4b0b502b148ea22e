//! Purchase status codes.
//!
//! The backend encodes the lifecycle of a purchase as a small signed integer.
//! `-1` marks lines still sitting in the cart; `0` is only used as a query
//! filter meaning "every status except in-cart".

use serde::{Deserialize, Serialize};

/// Lifecycle status of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(try_from = "i8", into = "i8")]
pub enum PurchaseStatus {
    /// Line item in the shopping cart.
    #[default]
    InCart,
    /// Query filter: every placed order regardless of status.
    All,
    /// Placed, waiting for the shop to confirm.
    WaitForConfirmation,
    /// Confirmed, waiting for the carrier to pick it up.
    WaitForGetting,
    /// Handed to the carrier.
    InProgress,
    /// Delivered to the customer.
    Delivered,
    /// Cancelled by either side.
    Cancelled,
}

impl PurchaseStatus {
    /// Every status, in wire-code order.
    pub const ALL: [Self; 7] = [
        Self::InCart,
        Self::All,
        Self::WaitForConfirmation,
        Self::WaitForGetting,
        Self::InProgress,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The integer used on the wire.
    #[must_use]
    pub const fn code(self) -> i8 {
        match self {
            Self::InCart => -1,
            Self::All => 0,
            Self::WaitForConfirmation => 1,
            Self::WaitForGetting => 2,
            Self::InProgress => 3,
            Self::Delivered => 4,
            Self::Cancelled => 5,
        }
    }
}

/// Error returned for an unknown purchase status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid purchase status code: {0}")]
pub struct InvalidPurchaseStatus(pub i8);

impl TryFrom<i8> for PurchaseStatus {
    type Error = InvalidPurchaseStatus;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or(InvalidPurchaseStatus(code))
    }
}

impl From<PurchaseStatus> for i8 {
    fn from(status: PurchaseStatus) -> Self {
        status.code()
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InCart => write!(f, "in_cart"),
            Self::All => write!(f, "all"),
            Self::WaitForConfirmation => write!(f, "wait_for_confirmation"),
            Self::WaitForGetting => write!(f, "wait_for_getting"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for PurchaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.to_string() == s)
            .ok_or_else(|| format!("invalid purchase status: {s}"))
    }
}

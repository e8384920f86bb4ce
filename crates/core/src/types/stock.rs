//! Stock decrement policy applied when an order is fulfilled.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stock policy: {0} (expected `unguarded` or `guarded`)")]
pub struct StockPolicyError(pub String);

/// How order fulfillment decrements product stock.
///
/// Both variants are a single atomic store operation per line item and both
/// are best-effort relative to the order write: a failed decrement never
/// un-places an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// `stock = stock - qty` unconditionally. Concurrent checkouts of the
    /// last unit both succeed and stock may go negative.
    #[default]
    Unguarded,
    /// `stock = stock - qty` only when `stock >= qty`; otherwise the product
    /// is left untouched and the shortfall is reported.
    Guarded,
}

impl std::fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unguarded => write!(f, "unguarded"),
            Self::Guarded => write!(f, "guarded"),
        }
    }
}

impl std::str::FromStr for StockPolicy {
    type Err = StockPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unguarded" => Ok(Self::Unguarded),
            "guarded" => Ok(Self::Guarded),
            _ => Err(StockPolicyError(s.to_owned())),
        }
    }
}

//! Order types: the checkout request as submitted and the stored order.
//!
//! An order is a snapshot. Customer details, item names and prices are copied
//! from the request and never re-read from the catalog afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use jandl_core::{OrderId, ProductId};

/// Customer details copied into the order at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub customer: Option<CustomerSnapshot>,
    #[serde(default)]
    pub items: Option<Vec<LineItemInput>>,
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// One cart line as the client submitted it.
///
/// `product_id` distinguishes an absent key (`None`, an unlinked line such as
/// a gift card) from a key that is present with any JSON value
/// (`Some(value)`, including `Some(Value::Null)`), which must then resolve to
/// a catalog product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub product_id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_qty")]
    pub qty: Option<i64>,
}

/// Accepts whole numbers sent as JSON numbers (`2`, `2.0`) or numeric
/// strings (`"2"`). Blank strings and `null` mean no quantity.
fn lenient_qty<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(whole_number))
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("qty must be a whole number, got {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(whole_number))
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("qty must be a whole number, got {s:?}")))
        }
        other => Err(D::Error::custom(format!(
            "qty must be a number, got {other}"
        ))),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn whole_number(n: f64) -> Option<i64> {
    let truncated = n as i64;
    (truncated as f64 == n).then_some(truncated)
}

/// Keeps `null` distinguishable from a missing key.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A stored order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub qty: Option<i64>,
}

impl LineItem {
    /// Units this line removes from stock.
    ///
    /// A missing or non-positive quantity counts as one unit. The stored
    /// `qty` is left exactly as submitted.
    #[must_use]
    pub fn stock_quantity(&self) -> i64 {
        self.qty.filter(|qty| *qty >= 1).unwrap_or(1)
    }

    /// `price * qty` using the same quantity rule as stock.
    ///
    /// `None` when the line carries no price or the product overflows.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.price
            .and_then(|price| price.checked_mul(Decimal::from(self.stock_quantity())))
    }
}

/// Everything the order store needs to append an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer: CustomerSnapshot,
    pub items: Vec<LineItem>,
    pub total: Decimal,
}

/// A placed order. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer: CustomerSnapshot,
    pub items: Vec<LineItem>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

//! Order intake service.
//!
//! Placing an order runs in two phases:
//!
//! 1. **Validation** (read-only): every line item that carries a `productId`
//!    key is resolved against the catalog. All items are checked and every
//!    failure is collected; any failure rejects the whole order.
//! 2. **Commit**: the order is appended with the customer snapshot, the items
//!    and the client total exactly as submitted, then each linked item's stock
//!    is decremented independently. Decrement failures never undo the order.
//!
//! The order write and the decrements are not one transaction. Under
//! [`StockPolicy::Unguarded`] two concurrent checkouts of the last unit both
//! succeed and stock ends below zero.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use jandl_core::{ProductId, StockPolicy};

use crate::db::{CatalogStore, OrderStore, RepositoryError, StockUpdate};
use crate::models::{LineItem, LineItemInput, NewOrder, Order, PlaceOrderRequest};

/// Why a line item was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectionReason {
    /// `productId` key present but `null` or empty.
    #[serde(rename = "missing productId")]
    MissingProductId,
    /// `productId` is not a UUID string.
    #[serde(rename = "invalid productId format")]
    MalformedProductId,
    /// Well-formed id with no catalog record.
    #[serde(rename = "product not found")]
    ProductNotFound,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MissingProductId => "missing productId",
            Self::MalformedProductId => "invalid productId format",
            Self::ProductNotFound => "product not found",
        })
    }
}

/// One entry of the `details` list returned for a rejected cart.
///
/// A missing id echoes the whole submitted item; the other reasons echo the
/// offending `productId` value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRejection {
    pub index: usize,
    pub reason: RejectionReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<LineItemInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Value>,
}

impl ItemRejection {
    fn missing(index: usize, item: &LineItemInput) -> Self {
        Self {
            index,
            reason: RejectionReason::MissingProductId,
            item: Some(item.clone()),
            product_id: None,
        }
    }

    fn for_id(index: usize, reason: RejectionReason, product_id: &Value) -> Self {
        Self {
            index,
            reason,
            item: None,
            product_id: Some(product_id.clone()),
        }
    }
}

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Items absent or empty.
    #[error("no items in order")]
    EmptyOrder,

    /// One or more line items reference a missing, malformed or unknown product.
    #[error("{} invalid order item(s)", .0.len())]
    InvalidOrderItems(Vec<ItemRejection>),

    /// Catalog read or order write failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// What happened to one linked item's stock after the order was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustmentOutcome {
    Applied { remaining: i64 },
    /// Product deleted between validation and commit.
    ProductMissing,
    /// Guarded policy refused the decrement.
    Insufficient { available: i64 },
    /// Store error; the order still stands.
    Failed(String),
}

/// Per-item stock decrement result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    /// Position of the line item in the order.
    pub index: usize,
    pub product_id: ProductId,
    pub quantity: i64,
    pub outcome: AdjustmentOutcome,
}

/// A stored order plus the stock results for its linked items.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub adjustments: Vec<StockAdjustment>,
}

impl PlacedOrder {
    /// Emit one log line per stock adjustment.
    pub fn log_adjustments(&self) {
        for adj in &self.adjustments {
            match &adj.outcome {
                AdjustmentOutcome::Applied { remaining } => tracing::debug!(
                    order_id = %self.order.id,
                    product_id = %adj.product_id,
                    quantity = adj.quantity,
                    remaining,
                    "Stock decremented"
                ),
                AdjustmentOutcome::ProductMissing => tracing::warn!(
                    order_id = %self.order.id,
                    product_id = %adj.product_id,
                    index = adj.index,
                    "Product vanished before stock decrement"
                ),
                AdjustmentOutcome::Insufficient { available } => tracing::warn!(
                    order_id = %self.order.id,
                    product_id = %adj.product_id,
                    quantity = adj.quantity,
                    available,
                    "Insufficient stock, decrement skipped"
                ),
                AdjustmentOutcome::Failed(error) => tracing::error!(
                    order_id = %self.order.id,
                    product_id = %adj.product_id,
                    error = %error,
                    "Stock decrement failed"
                ),
            }
        }
    }
}

/// Order intake service.
///
/// Borrows the store handles for the duration of one request.
pub struct OrderIntake<'a> {
    catalog: &'a dyn CatalogStore,
    orders: &'a dyn OrderStore,
    policy: StockPolicy,
}

impl<'a> OrderIntake<'a> {
    /// Create a new order intake service.
    #[must_use]
    pub const fn new(
        catalog: &'a dyn CatalogStore,
        orders: &'a dyn OrderStore,
        policy: StockPolicy,
    ) -> Self {
        Self {
            catalog,
            orders,
            policy,
        }
    }

    /// Validate a cart without writing anything.
    ///
    /// Returns the items in stored form, with `productId` parsed where present.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::EmptyOrder` for an empty cart,
    /// `IntakeError::InvalidOrderItems` listing every bad item, or
    /// `IntakeError::Repository` if the catalog cannot be read.
    pub async fn validate(&self, items: &[LineItemInput]) -> Result<Vec<LineItem>, IntakeError> {
        if items.is_empty() {
            return Err(IntakeError::EmptyOrder);
        }

        let mut accepted = Vec::with_capacity(items.len());
        let mut rejections = Vec::new();

        for (index, item) in items.iter().enumerate() {
            match self.resolve(index, item).await? {
                Ok(product_id) => accepted.push(LineItem {
                    product_id,
                    name: item.name.clone(),
                    price: item.price,
                    qty: item.qty,
                }),
                Err(rejection) => rejections.push(rejection),
            }
        }

        if rejections.is_empty() {
            Ok(accepted)
        } else {
            Err(IntakeError::InvalidOrderItems(rejections))
        }
    }

    /// Resolve one item's product reference.
    ///
    /// The outer `Result` carries store failures, the inner one the verdict.
    async fn resolve(
        &self,
        index: usize,
        item: &LineItemInput,
    ) -> Result<Result<Option<ProductId>, ItemRejection>, RepositoryError> {
        let Some(raw) = &item.product_id else {
            return Ok(Ok(None));
        };

        let text = match raw {
            Value::Null => return Ok(Err(ItemRejection::missing(index, item))),
            Value::String(s) if s.is_empty() => {
                return Ok(Err(ItemRejection::missing(index, item)));
            }
            Value::String(s) => s,
            _ => {
                return Ok(Err(ItemRejection::for_id(
                    index,
                    RejectionReason::MalformedProductId,
                    raw,
                )));
            }
        };

        let Ok(id) = ProductId::parse(text) else {
            return Ok(Err(ItemRejection::for_id(
                index,
                RejectionReason::MalformedProductId,
                raw,
            )));
        };

        if self.catalog.get_product(id).await?.is_none() {
            return Ok(Err(ItemRejection::for_id(
                index,
                RejectionReason::ProductNotFound,
                raw,
            )));
        }

        Ok(Ok(Some(id)))
    }

    /// Validate, persist and fulfil an order.
    ///
    /// # Errors
    ///
    /// Returns any validation error from [`Self::validate`], or
    /// `IntakeError::Repository` if the order cannot be written. Stock
    /// decrement problems are reported in [`PlacedOrder::adjustments`],
    /// never as an error.
    pub async fn place(&self, request: PlaceOrderRequest) -> Result<PlacedOrder, IntakeError> {
        let items = request.items.unwrap_or_default();
        let items = self.validate(&items).await?;
        let total = request.total.unwrap_or_default();

        warn_on_total_mismatch(&items, total);

        let order = self
            .orders
            .create_order(NewOrder {
                customer: request.customer.unwrap_or_default(),
                items,
                total,
            })
            .await?;

        let mut adjustments = Vec::new();
        for (index, item) in order.items.iter().enumerate() {
            let Some(product_id) = item.product_id else {
                continue;
            };
            let quantity = item.stock_quantity();

            let outcome = match self
                .catalog
                .decrement_stock(product_id, quantity, self.policy)
                .await
            {
                Ok(StockUpdate::Applied { remaining }) => AdjustmentOutcome::Applied { remaining },
                Ok(StockUpdate::NotFound) => AdjustmentOutcome::ProductMissing,
                Ok(StockUpdate::Insufficient { available }) => {
                    AdjustmentOutcome::Insufficient { available }
                }
                Err(e) => AdjustmentOutcome::Failed(e.to_string()),
            };

            adjustments.push(StockAdjustment {
                index,
                product_id,
                quantity,
                outcome,
            });
        }

        Ok(PlacedOrder { order, adjustments })
    }
}

/// The client total is stored as sent; flag it when it disagrees with the
/// priced lines.
fn warn_on_total_mismatch(items: &[LineItem], total: Decimal) {
    let Some(computed) = line_items_total(items) else {
        tracing::warn!(client_total = %total, "Line item total overflowed, skipping check");
        return;
    };
    if computed != total {
        tracing::warn!(
            client_total = %total,
            computed_total = %computed,
            "Order total does not match line items"
        );
    }
}

/// Sum of the priced lines, or `None` on overflow.
fn line_items_total(items: &[LineItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |acc, item| match item.price {
        None => Some(acc),
        Some(_) => acc.checked_add(item.subtotal()?),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use async_trait::async_trait;

    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::{NewProduct, Product, ProductUpdate};

    /// Catalog that deletes one product just before its stock is decremented.
    struct VanishingCatalog {
        store: InMemoryStore,
        vanishing: ProductId,
    }

    #[async_trait]
    impl CatalogStore for VanishingCatalog {
        async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
            self.store.list_products().await
        }

        async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            self.store.get_product(id).await
        }

        async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
            self.store.create_product(product).await
        }

        async fn update_product(
            &self,
            id: ProductId,
            update: ProductUpdate,
        ) -> Result<Option<Product>, RepositoryError> {
            self.store.update_product(id, update).await
        }

        async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
            self.store.delete_product(id).await
        }

        async fn decrement_stock(
            &self,
            id: ProductId,
            quantity: i64,
            policy: StockPolicy,
        ) -> Result<StockUpdate, RepositoryError> {
            if id == self.vanishing {
                self.store.delete_product(id).await?;
            }
            self.store.decrement_stock(id, quantity, policy).await
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    async fn seed(store: &InMemoryStore, name: &str, stock: i64) -> ProductId {
        store
            .create_product(NewProduct {
                name: name.to_owned(),
                price: dec("24.99"),
                stock,
                ..NewProduct::default()
            })
            .await
            .unwrap()
            .id
    }

    fn request(body: Value) -> PlaceOrderRequest {
        serde_json::from_value(body).unwrap()
    }

    async fn stock_of(store: &InMemoryStore, id: ProductId) -> i64 {
        store.get_product(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_linked_item_decrements_stock() {
        let store = InMemoryStore::new();
        let id = seed(&store, "Sneakers", 10).await;
        let intake = OrderIntake::new(&store, &store, StockPolicy::Unguarded);

        let placed = intake
            .place(request(json!({
                "customer": {"name": "Ada", "email": "ada@example.com", "address": "1 Loop"},
                "items": [{"productId": id.to_string(), "name": "Sneakers", "price": 2499, "qty": 2}],
                "total": 4998
            })))
            .await
            .unwrap();

        assert_eq!(stock_of(&store, id).await, 8);
        assert_eq!(placed.order.total, dec("4998"));
        assert_eq!(placed.order.customer.name.as_deref(), Some("Ada"));
        assert_eq!(placed.order.items[0].price, Some(dec("2499")));
        assert_eq!(
            placed.adjustments,
            vec![StockAdjustment {
                index: 0,
                product_id: id,
                quantity: 2,
                outcome: AdjustmentOutcome::Applied { remaining: 8 },
            }]
        );
        assert_eq!(store.order_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_oversized_line_amounts_still_place_order() {
        let store = InMemoryStore::new();
        let intake = OrderIntake::new(&store, &store, StockPolicy::Unguarded);

        let placed = intake
            .place(request(json!({
                "items": [{"name": "Gift", "price": 1e20, "qty": 9_000_000_000_000_i64}],
                "total": 1
            })))
            .await
            .unwrap();

        assert_eq!(placed.order.total, Decimal::ONE);
        assert_eq!(placed.order.items[0].qty, Some(9_000_000_000_000));
        assert_eq!(store.order_count().unwrap(), 1);
    }

    #[test]
    fn test_line_items_total_handles_overflow() {
        let line = |price: &str, qty: i64| LineItem {
            product_id: None,
            name: None,
            price: Some(dec(price)),
            qty: Some(qty),
        };
        let unpriced = LineItem {
            price: None,
            ..line("0", 1)
        };

        assert_eq!(
            line_items_total(&[line("2.50", 2), unpriced, line("1", 0)]),
            Some(dec("6.00"))
        );
        assert_eq!(
            line_items_total(&[line("100000000000000000000", 9_000_000_000_000)]),
            None
        );
        assert_eq!(
            line_items_total(&[line("79228162514264337593543950335", 1), line("1", 1)]),
            None
        );
    }

    #[tokio::test]
    async fn test_unlinked_item_skips_stock() {
        let store = InMemoryStore::new();
        let intake = OrderIntake::new(&store, &store, StockPolicy::Unguarded);

        let placed = intake
            .place(request(json!({
                "items": [{"name": "Custom Gift Card", "price": 500, "qty": 1}],
                "total": 500
            })))
            .await
            .unwrap();

        assert!(placed.adjustments.is_empty());
        let item = &placed.order.items[0];
        assert_eq!(item.product_id, None);
        assert_eq!(item.name.as_deref(), Some("Custom Gift Card"));
        assert_eq!(item.qty, Some(1));
    }

    #[tokio::test]
    async fn test_malformed_id_rejects_without_writes() {
        let store = InMemoryStore::new();
        let intake = OrderIntake::new(&store, &store, StockPolicy::Unguarded);

        let err = intake
            .place(request(json!({"items": [{"productId": "not-a-valid-id-format"}]})))
            .await
            .unwrap_err();

        let IntakeError::InvalidOrderItems(rejections) = err else {
            panic!("expected InvalidOrderItems, got {err:?}");
        };
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].index, 0);
        assert_eq!(rejections[0].reason, RejectionReason::MalformedProductId);
        assert_eq!(store.order_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_and_absent_items() {
        let store = InMemoryStore::new();
        let intake = OrderIntake::new(&store, &store, StockPolicy::Unguarded);

        let empty = intake.place(request(json!({"items": []}))).await;
        assert!(matches!(empty, Err(IntakeError::EmptyOrder)));

        let absent = intake.place(request(json!({"total": 10}))).await;
        assert!(matches!(absent, Err(IntakeError::EmptyOrder)));
        assert_eq!(store.order_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_validation_collects_every_failure() {
        let store = InMemoryStore::new();
        let good = seed(&store, "Belt", 5).await;
        let unknown = ProductId::generate();
        let intake = OrderIntake::new(&store, &store, StockPolicy::Unguarded);

        let err = intake
            .place(request(json!({
                "items": [
                    {"productId": good.to_string(), "qty": 1},
                    {"productId": null, "name": "Ghost"},
                    {"productId": 42},
                    {"productId": unknown.to_string()},
                    {"productId": ""},
                    {"name": "Gift wrap"}
                ]
            })))
            .await
            .unwrap_err();

        let IntakeError::InvalidOrderItems(rejections) = err else {
            panic!("expected InvalidOrderItems, got {err:?}");
        };
        let summary: Vec<_> = rejections.iter().map(|r| (r.index, r.reason)).collect();
        assert_eq!(
            summary,
            vec![
                (1, RejectionReason::MissingProductId),
                (2, RejectionReason::MalformedProductId),
                (3, RejectionReason::ProductNotFound),
                (4, RejectionReason::MissingProductId),
            ]
        );
        assert_eq!(
            rejections[1].product_id,
            Some(json!(42)),
            "malformed ids echo the submitted value"
        );
        assert!(rejections[0].item.is_some());
        assert_eq!(stock_of(&store, good).await, 5);
        assert_eq!(store.order_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_validation_is_repeatable_and_read_only() {
        let store = InMemoryStore::new();
        let id = seed(&store, "Cap", 3).await;
        let intake = OrderIntake::new(&store, &store, StockPolicy::Unguarded);
        let items: Vec<LineItemInput> = serde_json::from_value(json!([
            {"productId": id.to_string(), "qty": 2},
            {"productId": "nope"}
        ]))
        .unwrap();

        let first = format!("{:?}", intake.validate(&items).await);
        let second = format!("{:?}", intake.validate(&items).await);

        assert_eq!(first, second);
        assert_eq!(stock_of(&store, id).await, 3);
        assert_eq!(store.order_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_last_unit_goes_negative() {
        let store = InMemoryStore::new();
        let id = seed(&store, "Raincoat", 1).await;
        let intake = OrderIntake::new(&store, &store, StockPolicy::Unguarded);
        let body = || request(json!({"items": [{"productId": id.to_string(), "qty": 1}], "total": 0}));

        let (a, b) = tokio::join!(intake.place(body()), intake.place(body()));

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(stock_of(&store, id).await, -1);
        assert_eq!(store.order_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_guarded_policy_keeps_order_but_skips_shortfall() {
        let store = InMemoryStore::new();
        let id = seed(&store, "Raincoat", 1).await;
        let intake = OrderIntake::new(&store, &store, StockPolicy::Guarded);

        let placed = intake
            .place(request(json!({"items": [{"productId": id.to_string(), "qty": 3}]})))
            .await
            .unwrap();

        assert_eq!(
            placed.adjustments[0].outcome,
            AdjustmentOutcome::Insufficient { available: 1 }
        );
        assert_eq!(stock_of(&store, id).await, 1);
        assert_eq!(store.order_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_qty_decrements_one_unit() {
        let store = InMemoryStore::new();
        let id = seed(&store, "Graphic Tee", 10).await;
        let intake = OrderIntake::new(&store, &store, StockPolicy::Unguarded);

        let placed = intake
            .place(request(json!({
                "items": [
                    {"productId": id.to_string(), "qty": 0},
                    {"productId": id.to_string(), "qty": -5},
                    {"productId": id.to_string()}
                ]
            })))
            .await
            .unwrap();

        assert_eq!(stock_of(&store, id).await, 7);
        assert_eq!(placed.order.items[1].qty, Some(-5));
    }

    #[tokio::test]
    async fn test_order_write_failure_skips_decrements() {
        let store = InMemoryStore::new();
        let id = seed(&store, "Wool Scarf", 4).await;
        store.fail_order_writes(true);
        let intake = OrderIntake::new(&store, &store, StockPolicy::Unguarded);

        let result = intake
            .place(request(json!({"items": [{"productId": id.to_string()}]})))
            .await;

        assert!(matches!(result, Err(IntakeError::Repository(_))));
        assert_eq!(stock_of(&store, id).await, 4);
    }

    #[tokio::test]
    async fn test_decrement_failure_is_absorbed() {
        let store = InMemoryStore::new();
        let id = seed(&store, "Leather Belt", 4).await;
        store.fail_stock_updates(true);
        let intake = OrderIntake::new(&store, &store, StockPolicy::Unguarded);

        let placed = intake
            .place(request(json!({"items": [{"productId": id.to_string()}]})))
            .await
            .unwrap();

        assert!(matches!(
            placed.adjustments[0].outcome,
            AdjustmentOutcome::Failed(_)
        ));
        assert_eq!(store.order_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_product_deleted_after_validation_keeps_order() {
        let store = InMemoryStore::new();
        let gone = seed(&store, "Raincoat", 3).await;
        let kept = seed(&store, "Wool Scarf", 5).await;
        let catalog = VanishingCatalog {
            store: store.clone(),
            vanishing: gone,
        };
        let intake = OrderIntake::new(&catalog, &store, StockPolicy::Unguarded);

        let placed = intake
            .place(request(json!({
                "items": [
                    {"productId": gone.to_string(), "qty": 1},
                    {"productId": kept.to_string(), "qty": 2}
                ]
            })))
            .await
            .unwrap();

        assert_eq!(store.order_count().unwrap(), 1);
        assert_eq!(placed.order.items.len(), 2);
        assert_eq!(
            placed.adjustments[0].outcome,
            AdjustmentOutcome::ProductMissing
        );
        assert_eq!(
            placed.adjustments[1].outcome,
            AdjustmentOutcome::Applied { remaining: 3 }
        );
        assert_eq!(stock_of(&store, kept).await, 3);
        assert!(store.get_product(gone).await.unwrap().is_none());
    }

    #[test]
    fn test_rejection_serializes_wire_shape() {
        let rejection = ItemRejection::for_id(
            0,
            RejectionReason::MalformedProductId,
            &json!("not-a-valid-id-format"),
        );
        assert_eq!(
            serde_json::to_value(&rejection).unwrap(),
            json!({
                "index": 0,
                "reason": "invalid productId format",
                "productId": "not-a-valid-id-format"
            })
        );
    }
}

//! Checkout and order listing route handlers.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::error::{AppError, AppJson, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Order, PlaceOrderRequest};
use crate::services::orders::OrderIntake;
use crate::state::AppState;

/// `POST /orders` - public checkout.
///
/// Responds `{ success: true, orderId }` once the order is stored, whatever
/// happens to the stock decrements afterwards.
#[tracing::instrument(skip_all)]
pub async fn place(
    State(state): State<AppState>,
    AppJson(request): AppJson<PlaceOrderRequest>,
) -> Result<Json<Value>> {
    let intake = OrderIntake::new(
        state.catalog(),
        state.orders(),
        state.config().stock_policy,
    );

    let placed = intake.place(request).await?;
    placed.log_adjustments();

    tracing::info!(
        order_id = %placed.order.id,
        items = placed.order.items.len(),
        total = %placed.order.total,
        "Order placed"
    );

    Ok(Json(json!({ "success": true, "orderId": placed.order.id })))
}

/// `GET /orders` (admin) - all orders, newest first.
#[tracing::instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    let orders = state
        .orders()
        .list_orders()
        .await
        .map_err(AppError::failed("Failed to fetch orders"))?;
    Ok(Json(orders))
}

//! `PostgreSQL` order store.
//!
//! Orders are documents: the customer snapshot and line items are kept as
//! JSONB exactly as they were accepted at checkout.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use jandl_core::OrderId;

use super::{OrderStore, RepositoryError};
use crate::models::{CustomerSnapshot, LineItem, NewOrder, Order};

/// Internal row type for `PostgreSQL` order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer: Json<CustomerSnapshot>,
    items: Json<Vec<LineItem>>,
    total: Decimal,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::from_uuid(row.id),
            customer: row.customer.0,
            items: row.items.0,
            total: row.total,
            created_at: row.created_at,
        }
    }
}

/// Order store backed by the `shop.customer_order` table.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO shop.customer_order (id, customer, items, total)
            VALUES ($1, $2, $3, $4)
            RETURNING id, customer, items, total, created_at
            ",
        )
        .bind(OrderId::generate().as_uuid())
        .bind(Json(&order.customer))
        .bind(Json(&order.items))
        .bind(order.total)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer, items, total, created_at
            FROM shop.customer_order
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

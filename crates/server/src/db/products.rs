//! `PostgreSQL` catalog store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use jandl_core::{ProductId, StockPolicy};

use super::{CatalogStore, RepositoryError, StockUpdate};
use crate::models::{NewProduct, Product, ProductUpdate};

const PRODUCT_COLUMNS: &str = "id, name, price, description, stock, image_url, created_at";

/// Internal row type for `PostgreSQL` product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    description: String,
    stock: i64,
    image_url: String,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::from_uuid(row.id),
            name: row.name,
            price: row.price,
            description: row.description,
            stock: row.stock,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

/// Catalog store backed by the `shop.product` table.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO shop.product (id, name, price, description, stock, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(ProductId::generate().as_uuid())
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.stock)
        .bind(&product.image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE shop.product
            SET name = COALESCE($2, name),
                price = COALESCE($3, price),
                description = COALESCE($4, description),
                stock = COALESCE($5, stock),
                image_url = COALESCE($6, image_url)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id.as_uuid())
        .bind(update.name)
        .bind(update.price)
        .bind(update.description)
        .bind(update.stock)
        .bind(update.image_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i64,
        policy: StockPolicy,
    ) -> Result<StockUpdate, RepositoryError> {
        let sql = match policy {
            StockPolicy::Unguarded => {
                "UPDATE shop.product SET stock = stock - $2 WHERE id = $1 RETURNING stock"
            }
            StockPolicy::Guarded => {
                "UPDATE shop.product SET stock = stock - $2 WHERE id = $1 AND stock >= $2 RETURNING stock"
            }
        };

        let remaining: Option<i64> = sqlx::query_scalar(sql)
            .bind(id.as_uuid())
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(remaining) = remaining {
            return Ok(StockUpdate::Applied { remaining });
        }

        // Nothing matched: either the product is gone or the guard refused.
        let available: Option<i64> =
            sqlx::query_scalar("SELECT stock FROM shop.product WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(match available {
            Some(available) => StockUpdate::Insufficient { available },
            None => StockUpdate::NotFound,
        })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

//! Persistence for the shop's three collections.
//!
//! # Database: `jandl`
//!
//! ## Tables (schema `shop`)
//!
//! - `product` - Catalog records, mutated by admin CRUD and order fulfillment
//! - `customer_order` - Append-only orders; customer and items stored as JSONB
//! - `account` - Users backing the admin token guard
//!
//! # Store handles
//!
//! Handlers and services never touch a pool directly. They receive
//! `Arc<dyn CatalogStore>`, `Arc<dyn OrderStore>` and `Arc<dyn UserStore>`
//! from [`crate::state::AppState`], so the same code runs against
//! `PostgreSQL` in production and [`memory::InMemoryStore`] in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p jandl-cli -- migrate
//! ```

pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use jandl_core::{Email, ProductId, StockPolicy};

use crate::models::{NewOrder, NewProduct, NewUser, Order, Product, ProductUpdate, User};

pub use memory::InMemoryStore;
pub use orders::PgOrderStore;
pub use products::PgCatalogStore;
pub use users::PgUserStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Backing store is unusable (e.g., a poisoned in-memory lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a single-product stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockUpdate {
    /// Stock was decremented; `remaining` is the new value (may be negative
    /// under [`StockPolicy::Unguarded`]).
    Applied { remaining: i64 },
    /// No product with that id exists any more.
    NotFound,
    /// Guarded decrement refused: only `available` units were in stock.
    Insufficient { available: i64 },
}

/// Product catalog access.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All products, newest first.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Look up one product.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Apply a partial update. Returns `None` if the product does not exist.
    async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Hard delete. Returns whether a product was removed.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// Remove `quantity` units from one product's stock in a single atomic
    /// store operation, following `policy`.
    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i64,
        policy: StockPolicy,
    ) -> Result<StockUpdate, RepositoryError>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Append-only order access.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order and return it with its generated id.
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// All orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError>;
}

/// User account access.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user together with their password hash, for login.
    async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

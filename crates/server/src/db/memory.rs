//! In-memory store for tests and local development.
//!
//! Implements all three store traits over `Vec`s guarded by one `RwLock` per
//! collection. Clone-friendly via `Arc`; clones share the same data. Each
//! stock decrement takes the catalog write lock once, so it is atomic with
//! respect to other decrements just like the single `UPDATE` in `PostgreSQL`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use jandl_core::{Email, OrderId, ProductId, StockPolicy, UserId};

use super::{CatalogStore, OrderStore, RepositoryError, StockUpdate, UserStore};
use crate::models::{NewOrder, NewProduct, NewUser, Order, Product, ProductUpdate, User};

#[derive(Default)]
struct Collections {
    products: RwLock<Vec<Product>>,
    orders: RwLock<Vec<Order>>,
    users: RwLock<Vec<(User, String)>>,
    fail_order_writes: AtomicBool,
    fail_stock_updates: AtomicBool,
}

/// Shared in-memory catalog, order and user store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Collections>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, RepositoryError> {
    lock.read()
        .map_err(|_| RepositoryError::Unavailable("lock poisoned".into()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, RepositoryError> {
    lock.write()
        .map_err(|_| RepositoryError::Unavailable("lock poisoned".into()))
}

impl InMemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed product, keeping its id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` if the lock is poisoned.
    pub fn insert_product(&self, product: Product) -> Result<(), RepositoryError> {
        write(&self.inner.products)?.push(product);
        Ok(())
    }

    /// Number of stored orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` if the lock is poisoned.
    pub fn order_count(&self) -> Result<usize, RepositoryError> {
        Ok(read(&self.inner.orders)?.len())
    }

    /// Make every subsequent `create_order` fail, to exercise the
    /// persistence-error path.
    pub fn fail_order_writes(&self, fail: bool) {
        self.inner.fail_order_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `decrement_stock` fail.
    pub fn fail_stock_updates(&self, fail: bool) {
        self.inner.fail_stock_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(read(&self.inner.products)?.iter().rev().cloned().collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(read(&self.inner.products)?
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let product = Product {
            id: ProductId::generate(),
            name: product.name,
            price: product.price,
            description: product.description,
            stock: product.stock,
            image_url: product.image_url,
            created_at: Utc::now(),
        };
        write(&self.inner.products)?.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut products = write(&self.inner.products)?;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        update.apply_to(product);
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut products = write(&self.inner.products)?;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() < before)
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i64,
        policy: StockPolicy,
    ) -> Result<StockUpdate, RepositoryError> {
        if self.inner.fail_stock_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("stock updates disabled".into()));
        }

        let mut products = write(&self.inner.products)?;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(StockUpdate::NotFound);
        };

        if policy == StockPolicy::Guarded && product.stock < quantity {
            return Ok(StockUpdate::Insufficient {
                available: product.stock,
            });
        }

        product.stock = product.stock.checked_sub(quantity).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("stock of {id} out of range"))
        })?;
        Ok(StockUpdate::Applied {
            remaining: product.stock,
        })
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        if self.inner.fail_order_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("order writes disabled".into()));
        }

        let order = Order {
            id: OrderId::generate(),
            customer: order.customer,
            items: order.items,
            total: order.total,
            created_at: Utc::now(),
        };
        write(&self.inner.orders)?.push(order.clone());
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        Ok(read(&self.inner.orders)?.iter().rev().cloned().collect())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut users = write(&self.inner.users)?;
        if users.iter().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let created = User {
            id: UserId::generate(),
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        users.push((created.clone(), user.password_hash));
        Ok(created)
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(read(&self.inner.users)?
            .iter()
            .find(|(u, _)| &u.email == email)
            .map(|(u, _)| u.clone()))
    }

    async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(read(&self.inner.users)?
            .iter()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }
}

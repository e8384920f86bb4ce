//! End-to-end tests for the Jandl shop API.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations and start the server
//! cargo run -p jandl-cli -- migrate
//! cargo run -p jandl-server
//!
//! # Run the ignored tests against it
//! SERVER_URL=http://localhost:3000 ADMIN_KEY=<key> \
//!     cargo test -p jandl-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Product CRUD and the admin guard
//! - `checkout` - Order intake and stock decrements
//! - `accounts` - Registration and login

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::Client;
use serde_json::Value;

/// Base URL of the running server.
#[must_use]
pub fn base_url() -> String {
    std::env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Shared admin key the server was started with.
#[must_use]
pub fn admin_key() -> String {
    std::env::var("ADMIN_KEY").unwrap_or_default()
}

/// Unique suffix so repeated runs never collide on names or emails.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// Create a product through the admin API and return its JSON record.
///
/// # Errors
///
/// Returns the transport error if the request cannot be sent or decoded.
pub async fn create_product(
    client: &Client,
    name: &str,
    price: f64,
    stock: i64,
) -> Result<Value, reqwest::Error> {
    client
        .post(format!("{}/products", base_url()))
        .header("x-admin-key", admin_key())
        .json(&serde_json::json!({ "name": name, "price": price, "stock": stock }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// Fetch a product's current stock.
///
/// # Errors
///
/// Returns the transport error if the request cannot be sent or decoded.
pub async fn stock_of(client: &Client, id: &str) -> Result<Option<i64>, reqwest::Error> {
    let product: Value = client
        .get(format!("{}/products/{id}", base_url()))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(product.get("stock").and_then(Value::as_i64))
}

/// Delete a product, ignoring failures. Used for cleanup.
pub async fn delete_product(client: &Client, id: &str) {
    let _ = client
        .delete(format!("{}/products/{id}", base_url()))
        .header("x-admin-key", admin_key())
        .send()
        .await;
}

//! Product catalog route handlers.
//!
//! Reads are public; writes require admin access.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use jandl_core::ProductId;

use crate::error::{AppError, AppJson, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, Product, ProductUpdate};
use crate::state::AppState;

const NOT_FOUND: &str = "Product not found";

/// A malformed id cannot name a product, so it is reported as not found.
fn parse_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|_| AppError::NotFound(NOT_FOUND))
}

/// `GET /products` - all products, newest first.
#[tracing::instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state
        .catalog()
        .list_products()
        .await
        .map_err(AppError::failed("Failed to fetch products"))?;
    Ok(Json(products))
}

/// `GET /products/{id}`
#[tracing::instrument(skip_all, fields(product_id = %id))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    let id = parse_id(&id)?;
    state
        .catalog()
        .get_product(id)
        .await
        .map_err(AppError::failed("Failed to fetch product"))?
        .map(Json)
        .ok_or(AppError::NotFound(NOT_FOUND))
}

/// `POST /products` (admin)
#[tracing::instrument(skip_all, fields(name = %product.name))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    AppJson(product): AppJson<NewProduct>,
) -> Result<Json<Product>> {
    product.validate().map_err(AppError::BadRequest)?;

    let product = state
        .catalog()
        .create_product(product)
        .await
        .map_err(AppError::failed("Failed to create product"))?;

    tracing::info!(product_id = %product.id, "Product created");
    Ok(Json(product))
}

/// `PUT /products/{id}` (admin) - partial update.
#[tracing::instrument(skip_all, fields(product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    AppJson(update): AppJson<ProductUpdate>,
) -> Result<Json<Product>> {
    let id = parse_id(&id)?;
    update.validate().map_err(AppError::BadRequest)?;

    let product = state
        .catalog()
        .update_product(id, update)
        .await
        .map_err(AppError::failed("Failed to update product"))?
        .ok_or(AppError::NotFound(NOT_FOUND))?;

    tracing::info!(product_id = %product.id, stock = product.stock, "Product updated");
    Ok(Json(product))
}

/// `DELETE /products/{id}` (admin)
#[tracing::instrument(skip_all, fields(product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;

    let deleted = state
        .catalog()
        .delete_product(id)
        .await
        .map_err(AppError::failed("Failed to delete product"))?;
    if !deleted {
        return Err(AppError::NotFound(NOT_FOUND));
    }

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(json!({ "success": true })))
}

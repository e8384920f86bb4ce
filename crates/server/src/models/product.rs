//! Product catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use jandl_core::ProductId;

/// A catalog product.
///
/// `stock` is signed: unguarded checkout decrements are allowed to push it
/// below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    #[serde(rename = "desc")]
    pub description: String,
    pub stock: i64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Admin payload for creating a product.
///
/// Everything but the name is optional and falls back to the catalog
/// defaults (zero price, zero stock, empty description and image).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default, rename = "desc")]
    pub description: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub image_url: String,
}

impl NewProduct {
    /// Check the fields an admin may get wrong.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for an empty name or negative price.
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_price(self.price)
    }
}

/// Admin payload for a partial product update.
///
/// Only the fields present in the request are changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub stock: Option<i64>,
    pub image_url: Option<String>,
}

impl ProductUpdate {
    /// # Errors
    ///
    /// Returns a client-facing message for an empty name or negative price.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    /// Apply the present fields to `product` in place.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = image_url;
        }
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Product name is required".to_owned());
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), String> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative".to_owned());
    }
    Ok(())
}

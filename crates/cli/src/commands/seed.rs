//! Catalog seeding from a YAML product list.
//!
//! # Usage
//!
//! ```bash
//! jandl seed products crates/cli/seed/products.yaml
//! ```
//!
//! Each entry uses the same field names as the admin API:
//!
//! ```yaml
//! - name: Classic Denim Jacket
//!   price: 1299.00
//!   desc: Timeless blue denim jacket with a comfortable fit.
//!   stock: 20
//!   imageUrl: ""
//! ```
//!
//! Products whose name is already in the catalog are skipped unless
//! `--allow-duplicates` is passed.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use jandl_server::db::{CatalogStore, PgCatalogStore, RepositoryError};
use jandl_server::models::NewProduct;

use super::CommandError;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid product file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Entry `index` failed validation.
    #[error("Product #{index}: {message}")]
    Invalid { index: usize, message: String },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Counts reported after a seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Load products from `file` into the database.
///
/// # Errors
///
/// Returns `SeedError` if the file is unreadable or invalid, or if the
/// database rejects an insert.
pub async fn products(file: &str, allow_duplicates: bool) -> Result<(), SeedError> {
    let products = load(Path::new(file))?;
    tracing::info!(count = products.len(), %file, "Loaded product file");

    let pool = super::connect().await?;
    let catalog = PgCatalogStore::new(pool);

    let summary = insert(&catalog, products, allow_duplicates).await?;
    tracing::info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        "Seeding complete!"
    );
    Ok(())
}

fn load(path: &Path) -> Result<Vec<NewProduct>, SeedError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse(&raw)
}

/// Parse and validate a YAML product list.
fn parse(raw: &str) -> Result<Vec<NewProduct>, SeedError> {
    let products: Vec<NewProduct> = serde_yaml::from_str(raw)?;
    for (index, product) in products.iter().enumerate() {
        product
            .validate()
            .map_err(|message| SeedError::Invalid { index, message })?;
    }
    Ok(products)
}

/// Insert `products` in file order, skipping names the catalog already has.
async fn insert(
    catalog: &dyn CatalogStore,
    products: Vec<NewProduct>,
    allow_duplicates: bool,
) -> Result<SeedSummary, SeedError> {
    let mut existing: HashSet<String> = if allow_duplicates {
        HashSet::new()
    } else {
        catalog
            .list_products()
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect()
    };

    let mut summary = SeedSummary::default();
    for product in products {
        if !allow_duplicates && existing.contains(&product.name) {
            tracing::debug!(name = %product.name, "Skipping existing product");
            summary.skipped += 1;
            continue;
        }

        let created = catalog.create_product(product).await?;
        tracing::info!(id = %created.id, name = %created.name, "Inserted product");
        existing.insert(created.name);
        summary.inserted += 1;
    }
    Ok(summary)
}

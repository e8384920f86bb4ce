//! Jandl Core - Shared types library.
//!
//! This crate provides common types used across the Jandl shop components:
//! - `server` - Public storefront API, checkout and admin endpoints
//! - `cli` - Command-line tools for migrations, seeding and admin accounts
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails and the stock policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

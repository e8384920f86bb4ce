//! Core types for the Jandl shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod stock;

pub use email::{Email, EmailError};
pub use id::*;
pub use stock::{StockPolicy, StockPolicyError};

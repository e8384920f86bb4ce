//! Business logic services.
//!
//! # Services
//!
//! - `orders` - Order intake: cart validation, order persistence, stock decrement
//! - `auth` - Account registration, password login and admin tokens

pub mod auth;
pub mod orders;

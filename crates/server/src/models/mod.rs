//! Domain models for the shop.
//!
//! These types are what handlers and services exchange. Row types used to
//! read from `PostgreSQL` live next to their repositories in [`crate::db`].

pub mod order;
pub mod product;
pub mod user;

pub use order::{CustomerSnapshot, LineItem, LineItemInput, NewOrder, Order, PlaceOrderRequest};
pub use product::{NewProduct, Product, ProductUpdate};
pub use user::{NewUser, User};

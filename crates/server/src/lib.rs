//! Jandl shop server library.
//!
//! The catalog, checkout and admin API, exposed as a library so the router
//! can be driven in tests against the in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

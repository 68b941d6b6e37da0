//! HTTP request handlers.
//!
//! - [`products`]: product CRUD and search under `/products`
//! - [`health`]: liveness check
//! - [`static_assets`]: the embedded admin UI
//!
//! Handlers return [`crate::errors::Result`], which renders failures as JSON error bodies with the
//! matching status code.

pub mod health;
pub mod products;
pub mod static_assets;

//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: request/response structures and their validation
//!
//! # Routes
//!
//! - `GET /` - admin UI
//! - `GET /health` - liveness
//! - `GET|POST /products` - list (with filters) and create
//! - `GET|PUT|DELETE /products/{id}` - read, update and delete
//!
//! Every route is documented with `utoipa`; the rendered docs are at `/docs`.

pub mod handlers;
pub mod models;

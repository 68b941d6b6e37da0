//! Database layer for data persistence and access.
//!
//! Implemented with SQLx over SQLite, following the repository pattern:
//!
//! ```text
//! API handlers  ->  db::handlers (repositories)  ->  db::models  ->  SQLite
//! ```
//!
//! - [`handlers`]: repository implementations for CRUD operations
//! - [`models`]: request and response structures for each table
//! - [`errors`]: database-specific error types
//!
//! Migrations live in `migrations/` and are embedded through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;

//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, builds and binds its queries, and
//! returns the models from [`crate::db::models`]. Mutations should go through a transaction:
//!
//! ```ignore
//! use catalog::db::handlers::{Products, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let product = Products::new(&mut tx).create(&request).await?;
//! tx.commit().await?;
//! ```

pub mod products;
pub mod repository;

pub use products::Products;
pub use repository::Repository;

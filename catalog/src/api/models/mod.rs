//! Request and response models for the REST API.

pub mod products;

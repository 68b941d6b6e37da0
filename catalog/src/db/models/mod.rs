//! Database record models matching table schemas.
//!
//! Each entity has a create request, an update request and a response type. These are kept
//! separate from the API models in [`crate::api::models`] so that storage and wire
//! representations can evolve independently; conversions go through `From` impls.

pub mod products;

use crate::api::models::products::Product;
use crate::types::{Category, ProductId};
use rust_decimal::Decimal;

/// Database request for creating a new product
#[derive(Debug, Clone)]
pub struct ProductCreateDBRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub available: bool,
    pub category: Category,
}

/// Database request for updating a product. Every column except `id` is overwritten.
#[derive(Debug, Clone)]
pub struct ProductUpdateDBRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub available: bool,
    pub category: Category,
}

/// Database response for a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDBResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub available: bool,
    pub category: Category,
}

impl From<&Product> for ProductCreateDBRequest {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            available: product.available,
            category: product.category,
        }
    }
}

impl From<&Product> for ProductUpdateDBRequest {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            available: product.available,
            category: product.category,
        }
    }
}

//! Database repository for products.

use crate::api::models::products::{DataValidationError, Product};
use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::products::{ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest};
use crate::types::{Category, ProductId};
use bon::Builder;
use rust_decimal::Decimal;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use std::str::FromStr;
use tracing::instrument;

/// Filter for listing products. Set fields are combined with AND; an empty filter matches
/// every product.
#[derive(Debug, Clone, Default, Builder)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub available: Option<bool>,
    /// Compared numerically, so `12.5` matches a stored `12.50`
    pub price: Option<Decimal>,
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: String,
    pub available: bool,
    pub category: Category,
}

impl TryFrom<ProductRow> for ProductDBResponse {
    type Error = anyhow::Error;

    fn try_from(src: ProductRow) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: src.id,
            name: src.name,
            description: src.description,
            price: Decimal::from_str(&src.price)?,
            available: src.available,
            category: src.category,
        })
    }
}

pub struct Products<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Products<'c> {
    type CreateRequest = ProductCreateDBRequest;
    type UpdateRequest = ProductUpdateDBRequest;
    type Response = ProductDBResponse;
    type Id = ProductId;
    type Filter = ProductFilter;

    #[instrument(skip(self, request), fields(name = %request.name, category = %request.category), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let product = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, description, price, available, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.price.to_string())
        .bind(request.available)
        .bind(request.category)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(product.try_into()?)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let product = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        match product {
            Some(p) => Ok(Some(p.try_into()?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, filter), fields(name = ?filter.name, category = ?filter.category, available = ?filter.available), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM products WHERE 1=1");

        if let Some(name) = &filter.name {
            query.push(" AND name = ").push_bind(name.clone());
        }
        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category);
        }
        if let Some(available) = filter.available {
            query.push(" AND available = ").push_bind(available);
        }
        query.push(" ORDER BY id");

        let rows = query.build_query_as::<ProductRow>().fetch_all(&mut *self.db).await?;

        let products = rows
            .into_iter()
            .map(ProductDBResponse::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Prices are stored as text, so numeric equality is checked here rather than in SQL
        Ok(match filter.price {
            Some(price) => products.into_iter().filter(|p| p.price == price).collect(),
            None => products,
        })
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let product = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products SET
                name = $2,
                description = $3,
                price = $4,
                available = $5,
                category = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.price.to_string())
        .bind(request.available)
        .bind(request.category)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(product.try_into()?)
    }
}

impl<'c> Products<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Write a product back to its row. The product must carry an id.
    #[instrument(skip(self, product), fields(product = %product), err)]
    pub async fn save(&mut self, product: &Product) -> Result<ProductDBResponse> {
        let id = product.id.ok_or(DbError::Validation(DataValidationError::MissingId))?;
        self.update(id, &ProductUpdateDBRequest::from(product)).await
    }
}

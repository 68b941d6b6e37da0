use crate::AppState;
use crate::api::models::products::{ListProductsQuery, Product};
use crate::db::errors::DbError;
use crate::db::handlers::{Products, Repository};
use crate::db::models::products::ProductCreateDBRequest;
use crate::errors::{Error, ErrorResponse, Result};
use crate::types::ProductId;
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;

#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    summary = "List products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Products matching every given filter", body = Vec<Product>),
        (status = 400, description = "Invalid or repeated filter parameter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_products(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListProductsQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>> {
    let Query(query) = query?;
    let filter = query.to_filter()?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut pool_conn);

    let products = repo.list(&filter).await?;
    tracing::info!("Returning {} products", products.len());
    Ok(Json(products.into_iter().map(Product::from).collect()))
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    summary = "Create product",
    request_body = Product,
    responses(
        (status = 201, description = "Product created", body = Product,
            headers(("Location" = String, description = "URL of the new product"))),
        (status = 400, description = "Invalid product data", body = ErrorResponse),
        (status = 415, description = "Content-Type is not application/json", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_product(State(state): State<AppState>, body: std::result::Result<Json<Value>, JsonRejection>) -> Result<Response> {
    let Json(payload) = body?;
    let product = Product::from_json(&payload)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let created = Products::new(&mut tx).create(&ProductCreateDBRequest::from(&product)).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let product = Product::from(created);
    tracing::info!("Product {} created", product);

    let location = format!("/products/{}", created_id(&product)?);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(product)).into_response())
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    summary = "Get product",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product details", body = Product),
        (status = 400, description = "Id is not an integer", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(product_id = tracing::field::Empty))]
pub async fn get_product(State(state): State<AppState>, path: std::result::Result<Path<ProductId>, PathRejection>) -> Result<Json<Product>> {
    let id = product_id(path)?;
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(product) => Ok(Json(Product::from(product))),
        None => Err(Error::product_not_found(id)),
    }
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "products",
    summary = "Update product",
    request_body = Product,
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Invalid product data", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 415, description = "Content-Type is not application/json", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(product_id = tracing::field::Empty))]
pub async fn update_product(
    State(state): State<AppState>,
    path: std::result::Result<Path<ProductId>, PathRejection>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Product>> {
    let id = product_id(path)?;
    let Json(payload) = body?;

    // The stored id is kept even if the body carries a different one
    let mut product = Product::from_json(&payload)?;
    product.id = Some(id);

    // A single UPDATE, so the transaction takes the write lock on its first statement
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let updated = match Products::new(&mut tx).save(&product).await {
        Ok(updated) => updated,
        Err(DbError::NotFound) => return Err(Error::product_not_found(id)),
        Err(e) => return Err(e.into()),
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(Product::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "products",
    summary = "Delete product",
    description = "Deleting an id that does not exist also succeeds.",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted or already absent"),
        (status = 400, description = "Id is not an integer", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(product_id = tracing::field::Empty))]
pub async fn delete_product(State(state): State<AppState>, path: std::result::Result<Path<ProductId>, PathRejection>) -> Result<StatusCode> {
    let id = product_id(path)?;
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let deleted = Products::new(&mut tx).delete(id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    if deleted {
        tracing::info!("Product {} deleted", id);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Fallback for verbs the product routes do not support
pub async fn method_not_allowed() -> Error {
    Error::MethodNotAllowed
}

/// Unwrap the `{id}` path segment and attach it to the current span
fn product_id(path: std::result::Result<Path<ProductId>, PathRejection>) -> Result<ProductId> {
    let Path(id) = path?;
    tracing::Span::current().record("product_id", id);
    Ok(id)
}

fn created_id(product: &Product) -> Result<ProductId> {
    product.id.ok_or_else(|| Error::Internal {
        operation: "read id of created product".to_string(),
    })
}

//! OpenAPI documentation for the catalog REST API.
//!
//! The document is served at `/openapi.json` and rendered with Scalar at `/docs`.

use crate::api;
use crate::errors::ErrorResponse;
use crate::types::Category;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Product Catalog API",
        description = "Create, read, update, delete and search products in the catalog."
    ),
    paths(
        api::handlers::health::health,
        api::handlers::products::list_products,
        api::handlers::products::create_product,
        api::handlers::products::get_product,
        api::handlers::products::update_product,
        api::handlers::products::delete_product,
    ),
    components(
        schemas(
            api::models::products::Product,
            api::models::products::HealthResponse,
            Category,
            ErrorResponse,
        )
    ),
    tags(
        (name = "products", description = "Product catalog management"),
        (name = "health", description = "Service liveness"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();

        assert!(paths.contains(&"/health".to_string()));
        assert!(paths.contains(&"/products".to_string()));
        assert!(paths.contains(&"/products/{id}".to_string()));

        let item = &doc.paths.paths["/products/{id}"];
        assert!(item.get.is_some() && item.put.is_some() && item.delete.is_some());
    }

    #[test]
    fn test_category_schema_is_registered() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("Category"));
        assert!(schemas.contains_key("Product"));
    }
}

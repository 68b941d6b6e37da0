//! Shared fixtures for unit and integration tests.

use crate::api::models::products::Product;
use crate::config::{Config, DatabaseConfig, PoolSettings};
use crate::types::Category;
use crate::{AppState, Application};
use axum_test::TestServer;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::SqlitePool;
use std::str::FromStr;
use tokio::net::TcpListener;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                ..Default::default()
            },
        },
        ..Default::default()
    }
}

/// An unsaved product with a generated description
pub fn create_test_product(name: &str, category: Category, available: bool, price: &str) -> Product {
    Product::new(
        name,
        format!("{name} ({})", category.as_str().to_lowercase()),
        Decimal::from_str(price).expect("test price must be a decimal"),
        available,
        category,
    )
}

/// Request body for creating the product [`create_test_product`] would build
pub fn product_payload(name: &str, category: Category, available: bool, price: &str) -> Value {
    let mut payload = create_test_product(name, category, available, price).to_json();
    if let Some(object) = payload.as_object_mut() {
        object.remove("id");
    }
    payload
}

/// In-process server over the given pool; migrations are expected to have run already
pub fn create_test_app(pool: SqlitePool) -> TestServer {
    let state = AppState::builder().db(pool).config(create_test_config()).build();
    let router = crate::build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Serve the full application on a random local port and return its base URL
pub async fn spawn_test_server(pool: SqlitePool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no local address");

    let app = Application::new_with_pool(create_test_config(), Some(pool))
        .await
        .expect("Failed to create application");
    tokio::spawn(app.serve_with_listener(listener, std::future::pending()));

    format!("http://{addr}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_payload_matches_product() {
        let payload = product_payload("Hat", Category::Cloths, true, "59.95");
        assert_eq!(
            payload,
            json!({
                "name": "Hat",
                "description": "Hat (cloths)",
                "price": "59.95",
                "available": true,
                "category": "CLOTHS"
            })
        );
    }
}

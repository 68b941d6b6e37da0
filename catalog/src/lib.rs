//! # catalog: Product catalog service
//!
//! `catalog` is a small REST service for managing a catalog of products. Each product has a
//! name, a description, a decimal price, an availability flag and a category. The service
//! exposes create, read, update, delete and search operations over HTTP, serves a browser admin
//! page that drives the same API, and ships a seeding client (`catalog-seed`) that resets a
//! running instance and loads products from a YAML file.
//!
//! ## Architecture
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum); persistence is SQLite
//! through SQLx. A request flows through three layers:
//!
//! - The **API layer** ([`api`]) validates the untyped JSON body into a
//!   [`Product`](api::models::products::Product), parses query filters and maps every outcome to a
//!   status code. Errors are rendered as JSON by [`errors::Error`].
//! - The **database layer** ([`db`]) implements the repository pattern. Mutating handlers open a
//!   transaction, run repository calls against it and commit; reads use a pooled connection.
//! - The **UI** is a static page embedded into the binary and served at `/`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use catalog::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = catalog::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     catalog::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     Application::new(config).await?.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await
//! }
//! ```
//!
//! ## Database Setup
//!
//! The database file is created if missing and migrations run on startup. They can also be run
//! by hand:
//!
//! ```no_run
//! # use sqlx::SqlitePool;
//! # async fn example(pool: SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
//! catalog::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
mod static_assets;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::api::handlers::{
    health::health,
    products::{create_product, delete_product, get_product, list_products, method_not_allowed, update_product},
    static_assets::serve_embedded_asset,
};
use crate::config::CorsOrigin;
use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
pub use openapi::ApiDoc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder().db(pool).config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

/// Get the catalog database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the connection pool and bring the schema up to date.
///
/// The database file is created if it does not exist. Note that `sqlite::memory:` gives every
/// pooled connection its own database, so in-memory use needs `max_connections: 1`.
async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let settings = &config.database.pool;
    let options = SqliteConnectOptions::from_str(&config.database.url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout())
        .idle_timeout(settings.idle_timeout())
        .connect_with(options)
        .await?;

    migrator().run(&pool).await?;
    info!("Database ready at {}", config.database.url);

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;

    let allow_origin = if cors_config.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Origins never carry the trailing slash Url adds
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials)
        .expose_headers([header::LOCATION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// - `/health` and the `/products` API, with a JSON 405 for unsupported verbs
/// - `/openapi.json` and the Scalar docs at `/docs`
/// - `/internal/metrics` when `enable_metrics` is set
/// - the embedded admin UI as the fallback
/// - CORS and request tracing around everything
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route(
            "/products",
            get(list_products).post(create_product).fallback(method_not_allowed),
        )
        .route(
            "/products/{id}",
            get(get_product)
                .put(update_product)
                .delete(delete_product)
                .fallback(method_not_allowed),
        )
        .with_state(state.clone());

    let router = Router::new()
        .merge(api_routes)
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .fallback(serve_embedded_asset);

    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(move || async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The HTTP server together with the resources it owns.
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance, opening the database from the configuration
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create a new application instance, reusing `pool` when given instead of opening one.
    ///
    /// Migrations are run against a provided pool as well.
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!("Starting catalog with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve_with_listener<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }

    /// Bind to the configured address and serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Catalog listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        self.serve_with_listener(listener, shutdown).await
    }
}

#[cfg(test)]
mod test {
    use super::AppState;
    use crate::config::{Config, CorsOrigin};
    use crate::test_utils::create_test_config;
    use axum::http::StatusCode;
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn test_application_integration(pool: SqlitePool) {
        let app = crate::Application::new_with_pool(create_test_config(), Some(pool)).await;
        assert!(app.is_ok(), "Application::new_with_pool should succeed");

        let server = app.unwrap().into_test_server();

        let health_response = server.get("/health").await;
        assert_eq!(health_response.status_code(), StatusCode::OK);

        let openapi_response = server.get("/openapi.json").await;
        assert_eq!(openapi_response.status_code(), StatusCode::OK);
        let doc = openapi_response.json::<serde_json::Value>();
        assert!(doc["paths"]["/products"].is_object());

        let docs_response = server.get("/docs").await;
        assert_eq!(docs_response.status_code(), StatusCode::OK);
        assert!(docs_response.text().contains("<html") || docs_response.text().contains("<!doctype html>"));
    }

    #[tokio::test]
    async fn test_application_new_opens_file_database() {
        let dir = std::env::temp_dir().join(format!("catalog-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut config = create_test_config();
        config.database.url = format!("sqlite://{}", dir.join("catalog.db").display());

        let server = crate::Application::new(config).await.unwrap().into_test_server();
        server.get("/products").await.assert_status_ok();

        std::fs::remove_dir_all(&dir).ok();
    }

    #[sqlx::test]
    async fn test_build_router_with_metrics_disabled(pool: SqlitePool) {
        let mut config = create_test_config();
        config.enable_metrics = false;

        let app_state = AppState::builder().db(pool).config(config).build();
        let router = super::build_router(&app_state).expect("Failed to build router");
        let server = axum_test::TestServer::new(router).expect("Failed to create test server");

        // Falls through to the static asset handler
        let metrics_response = server.get("/internal/metrics").await;
        assert_eq!(metrics_response.status_code(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_build_router_with_metrics_enabled(pool: SqlitePool) {
        let mut config = create_test_config();
        config.enable_metrics = true;

        let app_state = AppState::builder().db(pool).config(config).build();
        let router = super::build_router(&app_state).expect("Failed to build router");
        let server = axum_test::TestServer::new(router).expect("Failed to create test server");

        server.get("/health").await.assert_status_ok();

        let metrics_response = server.get("/internal/metrics").await;
        assert_eq!(metrics_response.status_code(), StatusCode::OK);
        let metrics_content = metrics_response.text();
        assert!(metrics_content.contains("# HELP") || metrics_content.contains("# TYPE"));
    }

    #[sqlx::test]
    async fn test_cors_preflight_for_configured_origin(pool: SqlitePool) {
        let mut config: Config = create_test_config();
        config.cors.allowed_origins = vec![CorsOrigin::Url("https://admin.example.com".parse().unwrap())];

        let app_state = AppState::builder().db(pool).config(config).build();
        let server = axum_test::TestServer::new(super::build_router(&app_state).unwrap()).unwrap();

        let response = server
            .method(axum::http::Method::OPTIONS, "/products")
            .add_header("Origin", "https://admin.example.com")
            .add_header("Access-Control-Request-Method", "POST")
            .await;

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .map(|v| v.to_str().unwrap()),
            Some("https://admin.example.com")
        );
    }

    #[test]
    fn test_cors_layer_accepts_wildcard() {
        let mut config = create_test_config();
        config.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        assert!(super::create_cors_layer(&config).is_ok());
    }
}

//! HTTP client for a running catalog service.
//!
//! Used by the `catalog-seed` binary to put a service into a known state: every existing product
//! is deleted, then a list of products is created.

use crate::api::models::products::Product;
use crate::types::ProductId;
use figment::{
    Figment,
    providers::{Format, Yaml},
};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use std::{path::Path, time::Duration};
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned {status}, expected {expected}")]
    UnexpectedStatus {
        method: Method,
        url: String,
        status: StatusCode,
        expected: StatusCode,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Products to load, as read from a YAML seed file
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub products: Vec<Product>,
}

impl SeedFile {
    /// Read a seed file of the form `products: [{name, description, price, available, category}]`
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            anyhow::bail!("seed file {} does not exist", path.display());
        }
        Ok(Figment::new().merge(Yaml::file(path)).extract()?)
    }
}

pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    /// `timeout` bounds each individual request
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Transport {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self { http, base_url })
    }

    fn products_url(&self, id: Option<ProductId>) -> Result<Url> {
        let path = match id {
            Some(id) => format!("products/{id}"),
            None => "products".to_string(),
        };
        Ok(self.base_url.join(&path)?)
    }

    async fn send(&self, request: reqwest::RequestBuilder, method: Method, url: &Url, expected: StatusCode) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })?;

        debug!("{} {} => {}", method, url, response.status());
        if response.status() != expected {
            return Err(ClientError::UnexpectedStatus {
                method,
                url: url.to_string(),
                status: response.status(),
                expected,
            });
        }
        Ok(response)
    }

    #[instrument(skip(self), err)]
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let url = self.products_url(None)?;
        let response = self.send(self.http.get(url.clone()), Method::GET, &url, StatusCode::OK).await?;
        response.json().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })
    }

    #[instrument(skip(self), err)]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        let url = self.products_url(Some(id))?;
        self.send(self.http.delete(url.clone()), Method::DELETE, &url, StatusCode::NO_CONTENT)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, product), fields(product = %product), err)]
    pub async fn create_product(&self, product: &Product) -> Result<Product> {
        let url = self.products_url(None)?;
        let request = self.http.post(url.clone()).json(&product.to_json());
        let response = self.send(request, Method::POST, &url, StatusCode::CREATED).await?;
        response.json().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })
    }

    /// Delete every product, returning how many were removed
    pub async fn delete_all(&self) -> Result<usize> {
        let existing = self.list_products().await?;
        for product in &existing {
            if let Some(id) = product.id {
                self.delete_product(id).await?;
            }
        }
        Ok(existing.len())
    }

    /// Replace the whole catalog with `products`, returning them as stored
    pub async fn reset_and_load(&self, products: &[Product]) -> Result<Vec<Product>> {
        let removed = self.delete_all().await?;
        info!("Deleted {} existing products", removed);

        let mut created = Vec::with_capacity(products.len());
        for product in products {
            created.push(self.create_product(product).await?);
        }
        info!("Created {} products", created.len());

        Ok(created)
    }
}

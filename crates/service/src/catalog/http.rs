use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use configs::CatalogConfig;
use models::{Product, ProductId, Stock};

use super::retry::{retry_with_policy, RetryPolicy};
use super::{ProductService, StockService};
use crate::errors::CatalogError;

/// REST client for the storefront catalog.
///
/// - `GET {base_url}/stock/{id}` -> [`Stock`]
/// - `GET {base_url}/products/{id}` -> [`Product`]
#[derive(Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpCatalog {
    pub fn new(client: Client, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url, retry }
    }

    /// Build a client with the configured timeouts and retry policy.
    pub fn from_config(cfg: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;
        if !(cfg.base_url.starts_with("http://") || cfg.base_url.starts_with("https://")) {
            return Err(CatalogError::InvalidUrl(cfg.base_url.clone()));
        }
        Ok(Self::new(client, cfg.base_url.clone(), RetryPolicy::from_config(&cfg.retry)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        path: &str,
        product_id: ProductId,
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}/{}", self.base_url, path, product_id);
        retry_with_policy(&self.retry, || {
            let client = self.client.clone();
            let url = url.clone();
            async move {
                let resp = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| CatalogError::Network(e.to_string()))?;
                let status = resp.status();
                if status == StatusCode::NOT_FOUND {
                    return Err(CatalogError::NotFound { resource, product_id });
                }
                if !status.is_success() {
                    return Err(CatalogError::Status { status: status.as_u16(), url });
                }
                let body = resp.json::<T>().await.map_err(|e| CatalogError::Decode(e.to_string()))?;
                debug!(%url, "catalog response decoded");
                Ok(body)
            }
        })
        .await
    }
}

#[async_trait]
impl StockService for HttpCatalog {
    #[instrument(skip(self))]
    async fn stock(&self, product_id: ProductId) -> Result<Stock, CatalogError> {
        let mut stock: Stock = self.get_json("stock", "stock", product_id).await?;
        // Some backends omit the id; the path is authoritative.
        stock.id = product_id;
        Ok(stock)
    }
}

#[async_trait]
impl ProductService for HttpCatalog {
    #[instrument(skip(self))]
    async fn product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
        self.get_json("product", "products", product_id).await
    }
}

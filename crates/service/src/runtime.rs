//! Runtime wiring
//!
//! Builds a [`CartStore`] from configuration with the production
//! collaborators: HTTP catalog, JSON file storage and log notices.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use configs::AppConfig;

use crate::cart::{CartDeps, CartStore};
use crate::catalog::HttpCatalog;
use crate::notify::TracingNotifier;
use crate::storage::JsonFileKv;

/// Build the store; opening the storage file creates its directory.
pub async fn build_cart_store(cfg: &AppConfig) -> anyhow::Result<Arc<CartStore>> {
    let catalog = Arc::new(HttpCatalog::from_config(&cfg.catalog).context("build catalog client")?);
    let kv = JsonFileKv::open(&cfg.storage.path)
        .await
        .with_context(|| format!("open cart storage {}", cfg.storage.path))?;

    let deps = CartDeps {
        stock: catalog.clone(),
        products: catalog,
        kv,
        notifier: Arc::new(TracingNotifier),
    };
    let store = CartStore::new(deps, cfg.storage.cart_key.clone()).await?;
    info!(
        catalog = %cfg.catalog.base_url,
        storage = %cfg.storage.path,
        items = store.cart().len(),
        "cart store ready"
    );
    Ok(Arc::new(store))
}

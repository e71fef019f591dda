//! Remote catalog access: stock levels and product metadata.
//!
//! The cart store depends only on the two traits below; `HttpCatalog` is the
//! production implementation and `mock::MockCatalog` serves tests.

use async_trait::async_trait;

use models::{Product, ProductId, Stock};

use crate::errors::CatalogError;

pub mod http;
pub mod retry;

pub use http::HttpCatalog;
pub use retry::RetryPolicy;

/// Source of available quantities.
#[async_trait]
pub trait StockService: Send + Sync {
    async fn stock(&self, product_id: ProductId) -> Result<Stock, CatalogError>;
}

/// Source of product metadata.
#[async_trait]
pub trait ProductService: Send + Sync {
    async fn product(&self, product_id: ProductId) -> Result<Product, CatalogError>;
}

/// Simple in-memory catalog for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockCatalog {
        products: Mutex<HashMap<ProductId, Product>>,
        stock: Mutex<HashMap<ProductId, u32>>,
        offline: Mutex<bool>,
        stock_calls: AtomicUsize,
        product_calls: AtomicUsize,
    }

    impl MockCatalog {
        /// Register a product with the given stock level.
        pub fn with_product(self, id: ProductId, price: f64, stock: u32) -> Self {
            let product = Product {
                id,
                title: format!("Product {id}"),
                price,
                image: format!("https://cdn.example.com/{id}.jpg"),
            };
            self.products.lock().unwrap().insert(id, product);
            self.stock.lock().unwrap().insert(id, stock);
            self
        }

        pub fn set_stock(&self, id: ProductId, amount: u32) {
            self.stock.lock().unwrap().insert(id, amount);
        }

        /// While offline every call fails with a network error.
        pub fn set_offline(&self, offline: bool) {
            *self.offline.lock().unwrap() = offline;
        }

        pub fn stock_calls(&self) -> usize {
            self.stock_calls.load(Ordering::SeqCst)
        }

        pub fn product_calls(&self) -> usize {
            self.product_calls.load(Ordering::SeqCst)
        }

        fn check_online(&self) -> Result<(), CatalogError> {
            if *self.offline.lock().unwrap() {
                return Err(CatalogError::Network("catalog unreachable".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StockService for MockCatalog {
        async fn stock(&self, product_id: ProductId) -> Result<Stock, CatalogError> {
            self.stock_calls.fetch_add(1, Ordering::SeqCst);
            self.check_online()?;
            let stock = self.stock.lock().unwrap();
            stock
                .get(&product_id)
                .map(|amount| Stock { id: product_id, amount: *amount })
                .ok_or(CatalogError::NotFound { resource: "stock", product_id })
        }
    }

    #[async_trait]
    impl ProductService for MockCatalog {
        async fn product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
            self.product_calls.fetch_add(1, Ordering::SeqCst);
            self.check_online()?;
            let products = self.products.lock().unwrap();
            products
                .get(&product_id)
                .cloned()
                .ok_or(CatalogError::NotFound { resource: "product", product_id })
        }
    }
}

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use models::{Cart, LineItem, ProductId};

use super::domain::UpdateProductAmount;
use super::errors::{CartError, CartOperation};
use crate::catalog::{ProductService, StockService};
use crate::errors::StorageError;
use crate::notify::Notifier;
use crate::storage::PersistentKv;

/// Collaborators of the cart store.
#[derive(Clone)]
pub struct CartDeps {
    pub stock: Arc<dyn StockService>,
    pub products: Arc<dyn ProductService>,
    pub kv: Arc<dyn PersistentKv>,
    pub notifier: Arc<dyn Notifier>,
}

/// Read the persisted cart under `key`.
///
/// A missing key is an empty cart. Unparseable JSON, duplicate product ids and
/// zero amounts are reported as [`StorageError::Malformed`].
pub async fn load(kv: &dyn PersistentKv, key: &str) -> Result<Cart, StorageError> {
    match kv.get(key).await? {
        None => Ok(Cart::new()),
        Some(raw) => serde_json::from_str(&raw).map_err(|e| StorageError::malformed(key, e)),
    }
}

/// Shopping cart state container.
///
/// Holds the current cart as one shared snapshot. Every successful mutation
/// writes the whole cart to the key-value store and then publishes the new
/// snapshot. Operations are not serialised against each other: two concurrent
/// mutations start from the same snapshot and the later commit wins. Only the
/// commit itself is exclusive, so storage and memory always agree on the winner.
pub struct CartStore {
    cart: ArcSwap<Cart>,
    commit_lock: Mutex<()>,
    deps: CartDeps,
    key: String,
}

impl CartStore {
    /// Build the store and load the persisted cart once.
    ///
    /// Malformed persisted data is logged and replaced by an empty cart; the
    /// bad value stays in storage until the next successful mutation.
    pub async fn new(deps: CartDeps, key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        let cart = match load(deps.kv.as_ref(), &key).await {
            Ok(cart) => cart,
            Err(StorageError::Malformed { reason, .. }) => {
                warn!(%key, %reason, event = "cart_load_malformed", "persisted cart unreadable, starting empty");
                Cart::new()
            }
            Err(e) => return Err(e),
        };
        debug!(%key, items = cart.len(), "cart loaded");
        Ok(Self { cart: ArcSwap::from_pointee(cart), commit_lock: Mutex::new(()), deps, key })
    }

    /// Current cart snapshot.
    pub fn cart(&self) -> Arc<Cart> {
        self.cart.load_full()
    }

    /// Add one unit of a product, checking remote stock first.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::cart::{CartDeps, CartStore};
    /// use service::catalog::mock::MockCatalog;
    /// use service::notify::mock::RecordingNotifier;
    /// use service::storage::MemoryKv;
    ///
    /// let catalog = Arc::new(MockCatalog::default().with_product(1, 179.9, 5));
    /// let deps = CartDeps {
    ///     stock: catalog.clone(),
    ///     products: catalog,
    ///     kv: Arc::new(MemoryKv::new()),
    ///     notifier: Arc::new(RecordingNotifier::default()),
    /// };
    /// let store = tokio_test::block_on(CartStore::new(deps, "cart")).unwrap();
    /// let cart = tokio_test::block_on(store.add_product(1)).unwrap();
    /// assert_eq!(cart.get(1).map(|i| i.amount), Some(1));
    /// ```
    #[instrument(skip(self))]
    pub async fn add_product(&self, product_id: ProductId) -> Result<Arc<Cart>, CartError> {
        let result = self.try_add(product_id).await;
        self.finish(CartOperation::AddProduct, product_id, result)
    }

    /// Remove a product's line item.
    #[instrument(skip(self))]
    pub async fn remove_product(&self, product_id: ProductId) -> Result<Arc<Cart>, CartError> {
        let result = self.try_remove(product_id).await;
        self.finish(CartOperation::RemoveProduct, product_id, result)
    }

    /// Set a product's amount to an exact value within available stock.
    ///
    /// Non-positive amounts are ignored: the current cart is returned, nothing
    /// is persisted and nobody is notified.
    #[instrument(skip(self, input), fields(product_id = input.product_id, amount = input.amount))]
    pub async fn update_product_amount(&self, input: UpdateProductAmount) -> Result<Arc<Cart>, CartError> {
        if input.amount <= 0 {
            debug!("non-positive amount ignored");
            return Ok(self.cart());
        }
        let result = self.try_update(input.product_id, input.amount).await;
        self.finish(CartOperation::UpdateProductAmount, input.product_id, result)
    }

    async fn try_add(&self, product_id: ProductId) -> Result<Arc<Cart>, CartError> {
        let snapshot = self.cart();
        let stock = self.deps.stock.stock(product_id).await?;

        let next = match snapshot.get(product_id) {
            Some(existing) => {
                if existing.amount >= stock.amount {
                    return Err(CartError::StockExceeded {
                        product_id,
                        requested: existing.amount.saturating_add(1),
                        available: stock.amount,
                    });
                }
                snapshot
                    .with_amount(product_id, existing.amount + 1)?
                    .ok_or(CartError::NotFound { product_id })?
            }
            None => {
                if stock.amount < 1 {
                    return Err(CartError::StockExceeded { product_id, requested: 1, available: stock.amount });
                }
                let product = self.deps.products.product(product_id).await?;
                snapshot.with_item(LineItem::from_product(product))?
            }
        };

        self.commit(next).await
    }

    async fn try_remove(&self, product_id: ProductId) -> Result<Arc<Cart>, CartError> {
        let next = self.cart().without(product_id).ok_or(CartError::NotFound { product_id })?;
        self.commit(next).await
    }

    async fn try_update(&self, product_id: ProductId, amount: i64) -> Result<Arc<Cart>, CartError> {
        let snapshot = self.cart();
        if !snapshot.contains(product_id) {
            return Err(CartError::NotFound { product_id });
        }

        let stock = self.deps.stock.stock(product_id).await?;
        if amount > i64::from(stock.amount) {
            return Err(CartError::StockExceeded {
                product_id,
                requested: u32::try_from(amount).unwrap_or(u32::MAX),
                available: stock.amount,
            });
        }

        // 0 < amount <= stock.amount, so it fits in u32
        let amount = u32::try_from(amount).unwrap_or(stock.amount);
        let next = snapshot.with_amount(product_id, amount)?.ok_or(CartError::NotFound { product_id })?;
        self.commit(next).await
    }

    /// Persist the whole cart, then publish it as the current snapshot.
    ///
    /// The write and the publish happen under one lock so a later write is
    /// never overtaken by an earlier publish.
    async fn commit(&self, next: Cart) -> Result<Arc<Cart>, CartError> {
        let raw = serde_json::to_string(&next).map_err(|e| StorageError::Serialize(e.to_string()))?;
        let _guard = self.commit_lock.lock().await;
        self.deps.kv.set(&self.key, raw).await?;
        let next = Arc::new(next);
        self.cart.store(Arc::clone(&next));
        Ok(next)
    }

    fn finish(
        &self,
        op: CartOperation,
        product_id: ProductId,
        result: Result<Arc<Cart>, CartError>,
    ) -> Result<Arc<Cart>, CartError> {
        match &result {
            Ok(cart) => {
                let amount = cart.get(product_id).map(|i| i.amount).unwrap_or(0);
                info!(operation = op.as_str(), product_id, amount, items = cart.len(), "cart_updated");
            }
            Err(err) => {
                warn!(operation = op.as_str(), product_id, code = err.code(), error = %err, "cart_operation_failed");
                self.deps.notifier.notify(err.user_message(op));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::errors::{CartErrorKind, STOCK_EXCEEDED_MESSAGE};
    use crate::catalog::mock::MockCatalog;
    use crate::errors::CatalogError;
    use crate::notify::mock::RecordingNotifier;
    use crate::storage::MemoryKv;
    use async_trait::async_trait;
    use models::Stock;
    use tokio::sync::Barrier;

    const KEY: &str = "@RocketShoes:cart";

    struct Harness {
        store: CartStore,
        catalog: Arc<MockCatalog>,
        kv: Arc<MemoryKv>,
        notifier: Arc<RecordingNotifier>,
    }

    async fn harness_with(catalog: MockCatalog, kv: MemoryKv) -> Harness {
        let catalog = Arc::new(catalog);
        let kv = Arc::new(kv);
        let notifier = Arc::new(RecordingNotifier::default());
        let deps = CartDeps {
            stock: catalog.clone(),
            products: catalog.clone(),
            kv: kv.clone(),
            notifier: notifier.clone(),
        };
        let store = CartStore::new(deps, KEY).await.expect("store");
        Harness { store, catalog, kv, notifier }
    }

    async fn harness() -> Harness {
        let catalog = MockCatalog::default()
            .with_product(1, 179.9, 5)
            .with_product(2, 139.9, 2)
            .with_product(3, 99.9, 0);
        harness_with(catalog, MemoryKv::new()).await
    }

    async fn persisted(h: &Harness) -> Option<String> {
        h.kv.get(KEY).await.unwrap()
    }

    fn amounts(cart: &Cart) -> Vec<(ProductId, u32)> {
        cart.items().iter().map(|i| (i.id, i.amount)).collect()
    }

    #[tokio::test]
    async fn add_new_product_appends_single_item() -> Result<(), anyhow::Error> {
        let h = harness().await;
        let cart = h.store.add_product(1).await?;
        assert_eq!(amounts(&cart), vec![(1, 1)]);
        let item = cart.get(1).unwrap();
        assert_eq!(item.title, "Product 1");
        assert_eq!(item.image, "https://cdn.example.com/1.jpg");
        assert!(h.notifier.messages().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn add_existing_increments_by_one_and_keeps_others() -> Result<(), anyhow::Error> {
        let h = harness().await;
        h.store.add_product(1).await?;
        h.store.add_product(2).await?;
        let cart = h.store.add_product(1).await?;
        assert_eq!(amounts(&cart), vec![(1, 2), (2, 1)]);
        // metadata is fetched only on first add
        assert_eq!(h.catalog.product_calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn add_at_stock_limit_is_rejected_and_cart_unchanged() -> Result<(), anyhow::Error> {
        let h = harness().await;
        h.store.add_product(2).await?;
        h.store.add_product(2).await?;
        let before = persisted(&h).await;

        let err = h.store.add_product(2).await.unwrap_err();
        assert_eq!(err.kind(), CartErrorKind::StockExceeded);
        assert_eq!(amounts(&h.store.cart()), vec![(2, 2)]);
        assert_eq!(persisted(&h).await, before);
        assert_eq!(h.notifier.last().as_deref(), Some(STOCK_EXCEEDED_MESSAGE));
        Ok(())
    }

    #[tokio::test]
    async fn add_after_stock_drops_below_cart_amount_is_rejected() -> Result<(), anyhow::Error> {
        let h = harness().await;
        h.store.add_product(1).await?;
        h.store.add_product(1).await?;
        h.catalog.set_stock(1, 1);

        let err = h.store.add_product(1).await.unwrap_err();
        assert!(matches!(err, CartError::StockExceeded { requested: 3, available: 1, .. }));
        assert_eq!(amounts(&h.store.cart()), vec![(1, 2)]);
        Ok(())
    }

    #[tokio::test]
    async fn add_without_stock_never_fetches_metadata() {
        let h = harness().await;
        let err = h.store.add_product(3).await.unwrap_err();
        assert!(matches!(err, CartError::StockExceeded { available: 0, .. }));
        assert_eq!(h.catalog.product_calls(), 0);
        assert!(h.store.cart().is_empty());
        assert_eq!(h.notifier.messages(), vec![STOCK_EXCEEDED_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn add_with_catalog_down_shows_generic_message() {
        let h = harness().await;
        h.catalog.set_offline(true);
        let err = h.store.add_product(1).await.unwrap_err();
        assert!(matches!(err, CartError::Catalog(CatalogError::Network(_))));
        assert!(h.store.cart().is_empty());
        assert_eq!(h.notifier.last().as_deref(), Some("failed to add product"));
    }

    #[tokio::test]
    async fn add_unknown_product_shows_generic_message() {
        let h = harness().await;
        let err = h.store.add_product(42).await.unwrap_err();
        assert_eq!(err.kind(), CartErrorKind::Generic);
        assert_eq!(h.notifier.last().as_deref(), Some("failed to add product"));
    }

    #[tokio::test]
    async fn remove_present_keeps_order_of_rest() -> Result<(), anyhow::Error> {
        let h = harness().await;
        h.store.add_product(1).await?;
        h.store.add_product(2).await?;
        let cart = h.store.remove_product(1).await?;
        assert_eq!(amounts(&cart), vec![(2, 1)]);
        assert_eq!(load(h.kv.as_ref(), KEY).await?, *cart);
        Ok(())
    }

    #[tokio::test]
    async fn remove_absent_is_not_found() -> Result<(), anyhow::Error> {
        let h = harness().await;
        h.store.add_product(1).await?;
        let before = persisted(&h).await;
        let err = h.store.remove_product(2).await.unwrap_err();
        assert!(matches!(err, CartError::NotFound { product_id: 2 }));
        assert_eq!(amounts(&h.store.cart()), vec![(1, 1)]);
        assert_eq!(persisted(&h).await, before);
        assert_eq!(h.notifier.last().as_deref(), Some("failed to remove product"));
        Ok(())
    }

    #[tokio::test]
    async fn update_non_positive_is_silent_noop() -> Result<(), anyhow::Error> {
        let h = harness().await;
        h.store.add_product(1).await?;
        let before = persisted(&h).await;
        let stock_calls = h.catalog.stock_calls();

        for amount in [0, -3] {
            let cart = h.store.update_product_amount(UpdateProductAmount { product_id: 1, amount }).await?;
            assert_eq!(amounts(&cart), vec![(1, 1)]);
        }
        // also for products that are not in the cart
        h.store.update_product_amount(UpdateProductAmount { product_id: 9, amount: 0 }).await?;

        assert_eq!(persisted(&h).await, before);
        assert_eq!(h.catalog.stock_calls(), stock_calls);
        assert!(h.notifier.messages().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn update_sets_exact_amount_within_stock() -> Result<(), anyhow::Error> {
        let h = harness().await;
        h.store.add_product(1).await?;
        let cart = h.store.update_product_amount(UpdateProductAmount { product_id: 1, amount: 5 }).await?;
        assert_eq!(amounts(&cart), vec![(1, 5)]);
        let reloaded = load(h.kv.as_ref(), KEY).await?;
        assert_eq!(reloaded, *cart);
        Ok(())
    }

    #[tokio::test]
    async fn update_above_stock_is_rejected() -> Result<(), anyhow::Error> {
        let h = harness().await;
        h.store.add_product(1).await?;
        let err = h
            .store
            .update_product_amount(UpdateProductAmount { product_id: 1, amount: 6 })
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::StockExceeded { requested: 6, available: 5, .. }));
        assert_eq!(amounts(&h.store.cart()), vec![(1, 1)]);
        assert_eq!(h.notifier.last().as_deref(), Some(STOCK_EXCEEDED_MESSAGE));
        Ok(())
    }

    #[tokio::test]
    async fn update_absent_is_not_found_without_stock_lookup() {
        let h = harness().await;
        let err = h
            .store
            .update_product_amount(UpdateProductAmount { product_id: 1, amount: 2 })
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NotFound { product_id: 1 }));
        assert_eq!(h.catalog.stock_calls(), 0);
        assert_eq!(h.notifier.last().as_deref(), Some("failed to change product quantity"));
    }

    #[tokio::test]
    async fn update_with_catalog_down_shows_generic_message() -> Result<(), anyhow::Error> {
        let h = harness().await;
        h.store.add_product(1).await?;
        h.catalog.set_offline(true);
        let res = h.store.update_product_amount(UpdateProductAmount { product_id: 1, amount: 2 }).await;
        assert!(res.is_err());
        assert_eq!(h.notifier.last().as_deref(), Some("failed to change product quantity"));
        Ok(())
    }

    #[tokio::test]
    async fn persisted_cart_reloads_into_new_store() -> Result<(), anyhow::Error> {
        let h = harness().await;
        h.store.add_product(2).await?;
        h.store.add_product(1).await?;
        h.store.add_product(1).await?;

        let raw = persisted(&h).await.unwrap();
        let again = harness_with(MockCatalog::default(), MemoryKv::with_entry(KEY, raw)).await;
        assert_eq!(*again.store.cart(), *h.store.cart());
        assert_eq!(amounts(&again.store.cart()), vec![(2, 1), (1, 2)]);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_persisted_cart_starts_empty() {
        let kv = MemoryKv::with_entry(KEY, "{not json");
        assert!(matches!(load(&kv, KEY).await, Err(StorageError::Malformed { .. })));

        let h = harness_with(MockCatalog::default(), MemoryKv::with_entry(KEY, "{not json")).await;
        assert!(h.store.cart().is_empty());
        // left alone until the next successful mutation
        assert_eq!(persisted(&h).await.as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn duplicate_ids_in_storage_are_malformed() {
        let raw = r#"[{"id":1,"title":"a","price":1.0,"image":"x","amount":1},{"id":1,"title":"a","price":1.0,"image":"x","amount":1}]"#;
        let kv = MemoryKv::with_entry(KEY, raw);
        assert!(matches!(load(&kv, KEY).await, Err(StorageError::Malformed { .. })));
    }

    #[tokio::test]
    async fn scenario_add_add_update_remove() -> Result<(), anyhow::Error> {
        let h = harness().await;

        let cart = h.store.add_product(1).await?;
        assert_eq!(amounts(&cart), vec![(1, 1)]);

        let cart = h.store.add_product(1).await?;
        assert_eq!(amounts(&cart), vec![(1, 2)]);

        let res = h.store.update_product_amount(UpdateProductAmount { product_id: 1, amount: 10 }).await;
        assert!(matches!(res, Err(CartError::StockExceeded { .. })));
        assert_eq!(amounts(&h.store.cart()), vec![(1, 2)]);

        let cart = h.store.remove_product(1).await?;
        assert!(cart.is_empty());
        assert_eq!(persisted(&h).await.as_deref(), Some("[]"));
        Ok(())
    }

    /// Stock source that parks every caller until `parties` callers arrived.
    struct GatedStock {
        barrier: Barrier,
        amount: u32,
    }

    #[async_trait]
    impl StockService for GatedStock {
        async fn stock(&self, product_id: ProductId) -> Result<Stock, CatalogError> {
            self.barrier.wait().await;
            Ok(Stock { id: product_id, amount: self.amount })
        }
    }

    #[tokio::test]
    async fn concurrent_adds_are_last_write_wins() -> Result<(), anyhow::Error> {
        let catalog = Arc::new(MockCatalog::default().with_product(1, 10.0, 5));
        let kv = Arc::new(MemoryKv::with_entry(
            KEY,
            r#"[{"id":1,"title":"Product 1","price":10.0,"image":"x","amount":1}]"#,
        ));
        let deps = CartDeps {
            stock: Arc::new(GatedStock { barrier: Barrier::new(2), amount: 5 }),
            products: catalog,
            kv,
            notifier: Arc::new(RecordingNotifier::default()),
        };
        let store = CartStore::new(deps, KEY).await?;

        let (a, b) = tokio::join!(store.add_product(1), store.add_product(1));
        a?;
        b?;
        // both started from amount 1; one increment is lost
        assert_eq!(amounts(&store.cart()), vec![(1, 2)]);
        Ok(())
    }

    /// Storage whose writes always fail.
    struct FullDiskKv;

    #[async_trait]
    impl PersistentKv for FullDiskKv {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }
    }

    #[tokio::test]
    async fn storage_failure_leaves_cart_unchanged() -> Result<(), anyhow::Error> {
        let catalog = Arc::new(MockCatalog::default().with_product(1, 10.0, 5));
        let notifier = Arc::new(RecordingNotifier::default());
        let deps = CartDeps {
            stock: catalog.clone(),
            products: catalog,
            kv: Arc::new(FullDiskKv),
            notifier: notifier.clone(),
        };
        let store = CartStore::new(deps, KEY).await?;

        let err = store.add_product(1).await.unwrap_err();
        assert!(matches!(err, CartError::Storage(StorageError::Io(_))));
        assert_eq!(err.kind(), CartErrorKind::Generic);
        assert!(store.cart().is_empty());
        assert_eq!(notifier.last().as_deref(), Some("failed to add product"));
        Ok(())
    }

    /// Memory storage that suspends a few times after its first write lands.
    struct SlowFirstWriteKv {
        inner: MemoryKv,
        writes: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl PersistentKv for SlowFirstWriteKv {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
            self.inner.set(key, value).await?;
            if self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                for _ in 0..4 {
                    tokio::task::yield_now().await;
                }
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn overlapping_commits_agree_in_memory_and_storage() -> Result<(), anyhow::Error> {
        let catalog = Arc::new(MockCatalog::default().with_product(1, 10.0, 5).with_product(2, 20.0, 5));
        let kv = Arc::new(SlowFirstWriteKv { inner: MemoryKv::new(), writes: Default::default() });
        let deps = CartDeps {
            stock: catalog.clone(),
            products: catalog,
            kv: kv.clone(),
            notifier: Arc::new(RecordingNotifier::default()),
        };
        let store = CartStore::new(deps, KEY).await?;

        let (a, b) = tokio::join!(store.add_product(1), store.add_product(2));
        a?;
        b?;

        let on_disk = load(kv.as_ref(), KEY).await?;
        assert_eq!(*store.cart(), on_disk);
        Ok(())
    }
}

// Catalog
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Read-through cache of product listings with time-based expiration.

use crate::db::ProductsDb;
use crate::model::{Category, Product};
use catalog_core::db::DbResult;
use catalog_core::env::get_optional_var;
use derivative::Derivative;
use futures::lock::Mutex;
use log::{debug, info, warn};
use lru_time_cache::LruCache;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Default maximum amount of time to keep cached listings in memory.
const DEFAULT_TTL_SECONDS: u64 = 10 * 60;

/// Default maximum number of listings to keep cached in memory.
const DEFAULT_CAPACITY: usize = 64;

/// Options to configure a `CategoryCache`.
#[derive(Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct CategoryCacheOptions {
    /// The TTL for the entries in the cache.
    pub ttl: Duration,

    /// The cache capacity in number of entries.
    pub capacity: usize,
}

impl Default for CategoryCacheOptions {
    fn default() -> Self {
        Self { ttl: Duration::from_secs(DEFAULT_TTL_SECONDS), capacity: DEFAULT_CAPACITY }
    }
}

impl CategoryCacheOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_TTL` and `<prefix>_CAPACITY`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            ttl: get_optional_var::<Duration>(prefix, "TTL")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_TTL_SECONDS)),
            capacity: get_optional_var::<usize>(prefix, "CAPACITY")?.unwrap_or(DEFAULT_CAPACITY),
        })
    }
}

/// Identifies one cached listing.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum CacheKey {
    /// Listing of every stored product.
    AllProducts,

    /// Listing of the products in one category.
    Category(Category),
}

/// Version of a key's cached listing, captured before loading it from storage.
///
/// A load may only populate the cache if no invalidation touched its key in the meantime.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Generation {
    /// Number of times `invalidate_all` was called.
    epoch: u64,

    /// Number of times the key was invalidated individually.
    key: u64,
}

/// State of the cache, protected by a single lock.
struct CacheState {
    /// Cached listings, each in the same order as returned by the storage.
    entries: LruCache<CacheKey, Arc<Vec<Product>>>,

    /// Per-key invalidation counters.  Keys never invalidated are absent and count as zero.
    generations: BTreeMap<CacheKey, u64>,

    /// Invalidation counter shared by all keys.
    epoch: u64,
}

impl CacheState {
    /// Returns the current generation of `key`.
    fn generation(&self, key: CacheKey) -> Generation {
        Generation { epoch: self.epoch, key: self.generations.get(&key).copied().unwrap_or(0) }
    }

    /// Drops the listing for `key` and invalidates any load of it that is in flight.
    fn invalidate(&mut self, key: CacheKey) {
        self.entries.remove(&key);
        *self.generations.entry(key).or_insert(0) += 1;
    }
}

/// Cache of product listings in front of a `ProductsDb`.
///
/// Cached listings are shared with callers and never mutated: invalidation only drops them.
#[derive(Clone)]
pub struct CategoryCache {
    state: Arc<Mutex<CacheState>>,
}

impl CategoryCache {
    /// Creates a new empty cache configured with `opts`.
    pub fn new(opts: CategoryCacheOptions) -> Self {
        let entries = LruCache::with_expiry_duration_and_capacity(opts.ttl, opts.capacity);
        let state = CacheState { entries, generations: BTreeMap::default(), epoch: 0 };
        Self { state: Arc::from(Mutex::from(state)) }
    }

    /// Returns the cached listing for `key` or populates it from `db` on a miss.
    ///
    /// Storage errors are propagated and never cached.  A listing loaded while its key was
    /// invalidated is returned to the caller but not cached, as it may predate the change that
    /// triggered the invalidation.
    async fn get_or_load(
        &self,
        db: &(dyn ProductsDb + Send + Sync),
        key: CacheKey,
    ) -> DbResult<Arc<Vec<Product>>> {
        let generation = {
            let mut state = self.state.lock().await;
            if let Some(products) = state.entries.get(&key) {
                debug!("Cache hit for {:?}", key);
                return Ok(products.clone());
            }
            state.generation(key)
        };
        debug!("Cache miss for {:?}", key);

        let mut products = db.get_products().await?;
        if let CacheKey::Category(category) = key {
            products.retain(|p| *p.category() == category);
        }
        let products = Arc::from(products);

        let mut state = self.state.lock().await;
        if state.generation(key) != generation {
            debug!("Not caching {:?} because it was invalidated while loading", key);
            return Ok(products);
        }
        if state.entries.insert(key, Arc::clone(&products)).is_some() {
            warn!("Cache insertion race detected for {:?}", key);
        }
        debug!("Cached {} products for {:?}", products.len(), key);
        Ok(products)
    }

    /// Gets all products in `category`, reading through the cache.
    pub async fn get_by_category(
        &self,
        db: &(dyn ProductsDb + Send + Sync),
        category: Category,
    ) -> DbResult<Arc<Vec<Product>>> {
        self.get_or_load(db, CacheKey::Category(category)).await
    }

    /// Gets all stored products, reading through the cache.
    pub async fn get_all(
        &self,
        db: &(dyn ProductsDb + Send + Sync),
    ) -> DbResult<Arc<Vec<Product>>> {
        self.get_or_load(db, CacheKey::AllProducts).await
    }

    /// Drops the cached listing for `category` and the listing of all products, if present.
    pub async fn invalidate_category(&self, category: Category) {
        let mut state = self.state.lock().await;
        state.invalidate(CacheKey::Category(category));
        state.invalidate(CacheKey::AllProducts);
        info!("Invalidated cached products for category {}", category);
    }

    /// Drops every cached listing.
    pub async fn invalidate_all(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.epoch += 1;
        info!("Invalidated all cached products");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryProductsDb;
    use crate::db::tests::product;
    use async_trait::async_trait;
    use catalog_core::db::DbError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[test]
    pub fn test_options_from_env_all_present() {
        let overrides = [("CACHE_TTL", Some("30s")), ("CACHE_CAPACITY", Some("8"))];
        temp_env::with_vars(overrides, || {
            let opts = CategoryCacheOptions::from_env("CACHE").unwrap();
            assert_eq!(
                CategoryCacheOptions { ttl: Duration::from_secs(30), capacity: 8 },
                opts
            );
        });
    }

    #[test]
    pub fn test_options_from_env_use_defaults() {
        let overrides = ["CACHE_TTL", "CACHE_CAPACITY"];
        temp_env::with_vars_unset(overrides, || {
            let opts = CategoryCacheOptions::from_env("CACHE").unwrap();
            assert_eq!(CategoryCacheOptions::default(), opts);
            assert_eq!(Duration::from_secs(600), opts.ttl);
        });
    }

    #[test]
    pub fn test_options_from_env_bad_value() {
        temp_env::with_var("CACHE_TTL", Some("soon"), || {
            CategoryCacheOptions::from_env("CACHE").unwrap_err();
        });
    }

    /// Storage wrapper that counts how many listings were requested and can be made to fail.
    #[derive(Default)]
    struct CountingDb {
        delegee: MemoryProductsDb,
        listings: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl ProductsDb for CountingDb {
        async fn sku_exists(&self, sku: &str) -> DbResult<bool> {
            self.delegee.sku_exists(sku).await
        }

        async fn add_product(&self, product: &Product) -> DbResult<()> {
            self.delegee.add_product(product).await
        }

        async fn get_products(&self) -> DbResult<Vec<Product>> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(DbError::Unavailable);
            }
            self.delegee.get_products().await
        }
    }

    struct TestContext {
        db: CountingDb,
        cache: CategoryCache,
    }

    impl TestContext {
        fn setup(ttl: Duration) -> Self {
            let cache = CategoryCache::new(CategoryCacheOptions { ttl, capacity: 10 });
            Self { db: CountingDb::default(), cache }
        }

        fn listings(&self) -> usize {
            self.db.listings.load(Ordering::SeqCst)
        }

        async fn add(&self, sku: &str, category: Category) -> Product {
            let product = product(sku, category);
            self.db.add_product(&product).await.unwrap();
            product
        }
    }

    #[tokio::test]
    async fn test_get_by_category_filters() {
        let context = TestContext::setup(Duration::from_secs(600));
        let book1 = context.add("BOOK-0001", Category::Books).await;
        context.add("HOME-0001", Category::Home).await;
        let book2 = context.add("BOOK-0002", Category::Books).await;

        let books = context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        assert_eq!(vec![book1, book2], *books);

        let clothes = context.cache.get_by_category(&context.db, Category::Clothing).await.unwrap();
        assert!(clothes.is_empty());
    }

    #[tokio::test]
    async fn test_hits_return_identical_data() {
        let context = TestContext::setup(Duration::from_secs(600));
        context.add("BOOK-0001", Category::Books).await;

        let first = context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        let second = context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(1, context.listings());

        let all1 = context.cache.get_all(&context.db).await.unwrap();
        let all2 = context.cache.get_all(&context.db).await.unwrap();
        assert!(Arc::ptr_eq(&all1, &all2));
        assert_eq!(2, context.listings());
    }

    #[tokio::test]
    async fn test_invalidate_category() {
        let context = TestContext::setup(Duration::from_secs(600));
        context.add("BOOK-0001", Category::Books).await;
        context.add("HOME-0001", Category::Home).await;

        context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        context.cache.get_by_category(&context.db, Category::Home).await.unwrap();
        context.cache.get_all(&context.db).await.unwrap();
        assert_eq!(3, context.listings());

        context.add("BOOK-0002", Category::Books).await;
        context.cache.invalidate_category(Category::Books).await;
        context.cache.invalidate_category(Category::Books).await;

        let books = context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        assert_eq!(2, books.len());
        assert_eq!(4, context.listings());

        let homes = context.cache.get_by_category(&context.db, Category::Home).await.unwrap();
        assert_eq!(1, homes.len());
        assert_eq!(4, context.listings());

        let all = context.cache.get_all(&context.db).await.unwrap();
        assert_eq!(3, all.len());
        assert_eq!(5, context.listings());
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let context = TestContext::setup(Duration::from_secs(600));
        context.add("BOOK-0001", Category::Books).await;

        context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        context.cache.get_all(&context.db).await.unwrap();
        assert_eq!(2, context.listings());

        context.cache.invalidate_all().await;

        context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        context.cache.get_all(&context.db).await.unwrap();
        assert_eq!(4, context.listings());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let context = TestContext::setup(Duration::from_millis(50));
        context.add("BOOK-0001", Category::Books).await;

        context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        assert_eq!(1, context.listings());

        tokio::time::sleep(Duration::from_millis(100)).await;

        context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        assert_eq!(2, context.listings());
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let context = TestContext::setup(Duration::from_secs(600));
        context.add("BOOK-0001", Category::Books).await;

        context.db.fail.store(true, Ordering::SeqCst);
        assert_eq!(
            DbError::Unavailable,
            context.cache.get_by_category(&context.db, Category::Books).await.unwrap_err()
        );

        context.db.fail.store(false, Ordering::SeqCst);
        let books = context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        assert_eq!(1, books.len());
        assert_eq!(2, context.listings());
    }

    /// Storage whose first listing, once armed, stalls after taking its snapshot until released.
    #[derive(Default)]
    struct GatedDb {
        delegee: MemoryProductsDb,
        armed: AtomicBool,
        snapshot_taken: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ProductsDb for GatedDb {
        async fn sku_exists(&self, sku: &str) -> DbResult<bool> {
            self.delegee.sku_exists(sku).await
        }

        async fn add_product(&self, product: &Product) -> DbResult<()> {
            self.delegee.add_product(product).await
        }

        async fn get_products(&self) -> DbResult<Vec<Product>> {
            let products = self.delegee.get_products().await?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.snapshot_taken.notify_one();
                self.release.notified().await;
            }
            Ok(products)
        }
    }

    /// Starts a listing of books that stalls in storage, then adds a book while it is stalled
    /// and runs `invalidate` before letting the listing complete.
    ///
    /// Returns the listing seen by the stalled reader.
    async fn do_invalidate_during_load_test<F, Fut>(
        db: Arc<GatedDb>,
        cache: CategoryCache,
        invalidate: F,
    ) -> Arc<Vec<Product>>
    where
        F: FnOnce(CategoryCache) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        db.add_product(&product("BOOK-0001", Category::Books)).await.unwrap();
        db.armed.store(true, Ordering::SeqCst);

        let reader = {
            let db = db.clone();
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_by_category(&*db, Category::Books).await })
        };

        db.snapshot_taken.notified().await;
        db.add_product(&product("BOOK-0002", Category::Books)).await.unwrap();
        invalidate(cache).await;
        db.release.notify_one();

        reader.await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_invalidate_category_during_load_is_not_lost() {
        let db = Arc::from(GatedDb::default());
        let cache = CategoryCache::new(CategoryCacheOptions::default());

        let stale = do_invalidate_during_load_test(db.clone(), cache.clone(), |cache| async move {
            cache.invalidate_category(Category::Books).await
        })
        .await;
        assert_eq!(1, stale.len());

        let books = cache.get_by_category(&*db, Category::Books).await.unwrap();
        assert_eq!(2, books.len());
    }

    #[tokio::test]
    async fn test_invalidate_all_during_load_is_not_lost() {
        let db = Arc::from(GatedDb::default());
        let cache = CategoryCache::new(CategoryCacheOptions::default());

        let stale = do_invalidate_during_load_test(db.clone(), cache.clone(), |cache| async move {
            cache.invalidate_all().await
        })
        .await;
        assert_eq!(1, stale.len());

        let books = cache.get_by_category(&*db, Category::Books).await.unwrap();
        assert_eq!(2, books.len());
    }

    #[tokio::test]
    async fn test_load_after_invalidation_is_cached() {
        let context = TestContext::setup(Duration::from_secs(600));
        context.add("BOOK-0001", Category::Books).await;

        context.cache.invalidate_category(Category::Books).await;
        context.cache.invalidate_all().await;

        let first = context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        let second = context.cache.get_by_category(&context.db, Category::Books).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(1, context.listings());
    }
}

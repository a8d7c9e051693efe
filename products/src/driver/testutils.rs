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

//! Test utilities for the business layer.

use crate::cache::{CategoryCache, CategoryCacheOptions};
use crate::db::{MemoryProductsDb, ProductsDb};
use crate::driver::{Driver, DriverOptions};
use crate::model::*;
use async_trait::async_trait;
use catalog_core::clocks::Clock;
use catalog_core::clocks::testutils::SettableClock;
use catalog_core::db::{DbError, DbResult};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::macros::{date, datetime};
use time::{Date, OffsetDateTime};
use tokio_util::sync::CancellationToken;

/// Returns a request for a Books product with `sku` that passes all business rules.
pub(crate) fn books_request(sku: &str) -> NewProduct {
    NewProduct {
        name: "Test book".to_owned(),
        brand: "Acme Press".to_owned(),
        sku: sku.to_owned(),
        category: "Books".to_owned(),
        price: dec!(12.50),
        release_date: date!(2020 - 01 - 01),
        image_url: None,
        stock_quantity: 10,
    }
}

/// Storage that always reports the backend as unavailable.
pub(crate) struct UnavailableDb;

#[async_trait]
impl ProductsDb for UnavailableDb {
    async fn sku_exists(&self, _sku: &str) -> DbResult<bool> {
        Err(DbError::Unavailable)
    }

    async fn add_product(&self, _product: &Product) -> DbResult<()> {
        Err(DbError::Unavailable)
    }

    async fn get_products(&self) -> DbResult<Vec<Product>> {
        Err(DbError::Unavailable)
    }
}

/// Storage that looks empty but where every insertion loses a race against another writer.
#[derive(Default)]
pub(crate) struct RacingDb;

#[async_trait]
impl ProductsDb for RacingDb {
    async fn sku_exists(&self, _sku: &str) -> DbResult<bool> {
        Ok(false)
    }

    async fn add_product(&self, _product: &Product) -> DbResult<()> {
        Err(DbError::AlreadyExists)
    }

    async fn get_products(&self) -> DbResult<Vec<Product>> {
        Ok(vec![])
    }
}

/// Storage that fires a cancellation token after a number of successful insertions.
pub(crate) struct CancellingDb {
    delegee: MemoryProductsDb,
    cancel: CancellationToken,
    remaining: AtomicUsize,
}

impl CancellingDb {
    /// Creates a new storage that fires `cancel` after `inserts` successful insertions.
    pub(crate) fn new(cancel: CancellationToken, inserts: usize) -> Self {
        Self { delegee: MemoryProductsDb::new(), cancel, remaining: AtomicUsize::new(inserts) }
    }
}

#[async_trait]
impl ProductsDb for CancellingDb {
    async fn sku_exists(&self, sku: &str) -> DbResult<bool> {
        self.delegee.sku_exists(sku).await
    }

    async fn add_product(&self, product: &Product) -> DbResult<()> {
        self.delegee.add_product(product).await?;
        if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.cancel.cancel();
        }
        Ok(())
    }

    async fn get_products(&self) -> DbResult<Vec<Product>> {
        self.delegee.get_products().await
    }
}

/// Storage that panics when asked to insert a specific SKU.
pub(crate) struct PanickingDb {
    delegee: MemoryProductsDb,
    sku: String,
}

impl PanickingDb {
    /// Creates a new storage that panics when inserting `sku`.
    pub(crate) fn new(sku: &str) -> Self {
        Self { delegee: MemoryProductsDb::new(), sku: sku.to_owned() }
    }
}

#[async_trait]
impl ProductsDb for PanickingDb {
    async fn sku_exists(&self, sku: &str) -> DbResult<bool> {
        self.delegee.sku_exists(sku).await
    }

    async fn add_product(&self, product: &Product) -> DbResult<()> {
        if product.sku().as_str() == self.sku {
            panic!("Simulated crash while storing {}", self.sku);
        }
        self.delegee.add_product(product).await
    }

    async fn get_products(&self) -> DbResult<Vec<Product>> {
        self.delegee.get_products().await
    }
}

/// State of a running test.
pub(crate) struct TestContext {
    /// The storage backing the driver.
    db: Arc<dyn ProductsDb + Send + Sync>,

    /// The clock used by the driver, set to a fixed moment.
    clock: Arc<SettableClock>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver using an in-memory storage and a settable clock.
    pub(crate) async fn setup() -> Self {
        Self::setup_full(MemoryProductsDb::new(), DriverOptions::default()).await
    }

    /// Initializes the driver with a custom daily creation `limit`.
    pub(crate) async fn setup_with_limit(limit: usize) -> Self {
        let opts = DriverOptions { daily_creation_limit: limit };
        Self::setup_full(MemoryProductsDb::new(), opts).await
    }

    /// Initializes the driver on top of the given `db`.
    pub(crate) async fn setup_with_db<D>(db: D) -> Self
    where
        D: ProductsDb + Send + Sync + 'static,
    {
        Self::setup_full(db, DriverOptions::default()).await
    }

    /// Initializes the driver on top of the given `db` and with `opts`.
    async fn setup_full<D>(db: D, opts: DriverOptions) -> Self
    where
        D: ProductsDb + Send + Sync + 'static,
    {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let db: Arc<dyn ProductsDb + Send + Sync> = Arc::new(db);
        let clock = Arc::from(SettableClock::new(datetime!(2024-06-15 12:00:00 UTC)));
        let cache = CategoryCache::new(CategoryCacheOptions::default());
        let driver = Driver::new(db.clone(), clock.clone(), cache, opts);
        Self { db, clock, driver }
    }

    /// Gets access to the storage used by this test context.
    pub(crate) fn db(&self) -> &(dyn ProductsDb + Send + Sync) {
        self.db.as_ref()
    }

    /// Gets access to the clock used by this test context.
    pub(crate) fn clock(&self) -> &SettableClock {
        &self.clock
    }

    /// Returns the current time as seen by the driver.
    pub(crate) fn now(&self) -> OffsetDateTime {
        self.clock.now_utc()
    }

    /// Returns the current day as seen by the driver.
    pub(crate) fn today(&self) -> Date {
        self.clock.today_utc()
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }
}

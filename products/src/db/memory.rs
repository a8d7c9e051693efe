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

//! In-memory implementation of the products storage.

use crate::db::ProductsDb;
use crate::model::*;
use async_trait::async_trait;
use catalog_core::db::{DbError, DbResult};
use futures::lock::Mutex;
use log::debug;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

/// Products storage backed by an in-memory map keyed by SKU.
///
/// Cloning the storage yields a new handle to the same set of products.
#[derive(Clone, Default)]
pub struct MemoryProductsDb {
    /// Stored products.
    products: Arc<Mutex<BTreeMap<Sku, Product>>>,
}

impl MemoryProductsDb {
    /// Creates a new empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductsDb for MemoryProductsDb {
    async fn sku_exists(&self, sku: &str) -> DbResult<bool> {
        let products = self.products.lock().await;
        Ok(products.contains_key(sku))
    }

    async fn add_product(&self, product: &Product) -> DbResult<()> {
        let mut products = self.products.lock().await;
        match products.entry(product.sku().clone()) {
            Entry::Occupied(_) => Err(DbError::AlreadyExists),
            Entry::Vacant(entry) => {
                entry.insert(product.clone());
                debug!("Stored product {} with SKU {}", product.id(), product.sku());
                Ok(())
            }
        }
    }

    async fn get_products(&self) -> DbResult<Vec<Product>> {
        let products = self.products.lock().await;
        Ok(products.values().cloned().collect())
    }
}

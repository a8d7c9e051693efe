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

//! Storage abstraction in terms of the operations needed by the catalog.

use crate::model::*;
use catalog_core::db::DbResult;
mod memory;
pub use memory::MemoryProductsDb;

/// Product storage with the operations needed by the business layer.
///
/// Implementations must be safe to share across concurrently-running tasks and must guarantee
/// that no two stored products share the same SKU.
#[async_trait::async_trait]
pub trait ProductsDb {
    /// Checks whether a product with the given `sku` is already stored.
    async fn sku_exists(&self, sku: &str) -> DbResult<bool>;

    /// Stores a new `product`, failing with `AlreadyExists` if its SKU is taken.
    ///
    /// The check and the insertion happen atomically.
    async fn add_product(&self, product: &Product) -> DbResult<()>;

    /// Gets a snapshot of all stored products, sorted by SKU.
    async fn get_products(&self) -> DbResult<Vec<Product>>;
}

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

//! Data types for inventory metrics.

use crate::model::{Category, ProductId};
use derive_getters::Getters;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Aggregate figures for a single category.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
pub struct CategoryMetrics {
    /// The category these figures belong to.
    pub(crate) category: Category,

    /// Number of products in the category.
    pub(crate) product_count: usize,

    /// Number of products in the category with stock left.
    pub(crate) available_count: usize,

    /// Mean unit price of the products in the category, rounded to cents.
    pub(crate) average_price: Decimal,

    /// Sum of `price * stock_quantity` over the category.
    pub(crate) total_value: Decimal,

    /// Sum of the stock quantities over the category.
    pub(crate) total_stock: u64,
}

/// A product ranked by the value of its inventory.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
pub struct TopProduct {
    /// Identifier of the product.
    pub(crate) id: ProductId,

    /// Name of the product.
    pub(crate) name: String,

    /// Brand that manufactures the product.
    pub(crate) brand: String,

    /// Category the product belongs to.
    pub(crate) category: Category,

    /// Unit price in US dollars.
    pub(crate) price: Decimal,

    /// Number of units in stock.
    pub(crate) stock_quantity: u32,

    /// `price * stock_quantity`.
    pub(crate) total_value: Decimal,
}

/// Snapshot of inventory statistics over all stored products.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
pub struct ProductMetrics {
    /// Number of stored products.
    pub(crate) total_products: usize,

    /// Number of products with stock left.
    pub(crate) total_available_products: usize,

    /// Number of products without stock.
    pub(crate) total_out_of_stock: usize,

    /// Sum of `price * stock_quantity` over all products.
    pub(crate) total_inventory_value: Decimal,

    /// Sum of all stock quantities.
    pub(crate) total_stock_quantity: u64,

    /// Per-category figures.  Categories without products are omitted.
    pub(crate) category_metrics: BTreeMap<Category, CategoryMetrics>,

    /// Up to 10 products with the highest inventory value, in descending order.
    pub(crate) top_value_products: Vec<TopProduct>,

    /// Moment at which the snapshot was taken.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) generated_at: OffsetDateTime,
}

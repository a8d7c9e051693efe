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

//! Inventory metrics.

use crate::driver::Driver;
use crate::model::*;
use catalog_core::driver::DriverResult;
use log::info;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Maximum number of products to report in the ranking by inventory value.
const TOP_VALUE_PRODUCTS: usize = 10;

/// Computes the figures for the products of `category`.  `products` must not be empty.
fn category_metrics(category: Category, products: &[&Product]) -> CategoryMetrics {
    let total_price = products.iter().map(|p| p.price).sum::<Decimal>();
    let count = Decimal::from(products.len());
    CategoryMetrics {
        category,
        product_count: products.len(),
        available_count: products.iter().filter(|p| p.is_available).count(),
        average_price: (total_price / count).round_dp(2),
        total_value: products.iter().map(|p| p.inventory_value()).sum(),
        total_stock: products.iter().map(|p| u64::from(p.stock_quantity)).sum(),
    }
}

/// Computes a snapshot of inventory statistics over `products` as of `now`.
pub(crate) fn compute_metrics(products: &[Product], now: OffsetDateTime) -> ProductMetrics {
    let mut by_category: BTreeMap<Category, Vec<&Product>> = BTreeMap::new();
    for product in products {
        by_category.entry(product.category).or_default().push(product);
    }
    let category_metrics = by_category
        .into_iter()
        .map(|(category, products)| (category, category_metrics(category, &products)))
        .collect::<BTreeMap<Category, CategoryMetrics>>();

    let mut ranked = products.iter().collect::<Vec<&Product>>();
    ranked.sort_by(|a, b| {
        b.inventory_value().cmp(&a.inventory_value()).then_with(|| a.sku.cmp(&b.sku))
    });
    let top_value_products = ranked
        .into_iter()
        .take(TOP_VALUE_PRODUCTS)
        .map(|p| TopProduct {
            id: p.id,
            name: p.name.clone(),
            brand: p.brand.clone(),
            category: p.category,
            price: p.price,
            stock_quantity: p.stock_quantity,
            total_value: p.inventory_value(),
        })
        .collect();

    let total_available_products = products.iter().filter(|p| p.is_available).count();
    ProductMetrics {
        total_products: products.len(),
        total_available_products,
        total_out_of_stock: products.len() - total_available_products,
        total_inventory_value: products.iter().map(Product::inventory_value).sum(),
        total_stock_quantity: products.iter().map(|p| u64::from(p.stock_quantity)).sum(),
        category_metrics,
        top_value_products,
        generated_at: now,
    }
}

impl Driver {
    /// Computes inventory statistics over all stored products.
    ///
    /// The statistics are always computed from the storage, bypassing the listings cache.
    pub async fn get_metrics(self) -> DriverResult<ProductMetrics> {
        let products = self.db.get_products().await?;
        let metrics = compute_metrics(&products, self.clock.now_utc());
        info!(
            "Generated metrics for {} products with a total value of {}",
            metrics.total_products, metrics.total_inventory_value
        );
        Ok(metrics)
    }
}

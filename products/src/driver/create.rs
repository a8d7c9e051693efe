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

//! Creation of a single product.

use crate::driver::Driver;
use crate::driver::mapping::{new_product, product_view};
use crate::model::*;
use catalog_core::db::DbError;
use catalog_core::driver::{DriverError, DriverResult};
use log::{debug, info, warn};
use std::time::Instant;

impl Driver {
    /// Validates `request` and, if it passes all business rules, stores it as a new product.
    ///
    /// Returns the view of the created product.  Listings cached for the product's category are
    /// invalidated before returning.
    pub async fn create_product(self, request: NewProduct) -> DriverResult<ProductView> {
        let start = Instant::now();
        info!(
            "Creating product: name={}, brand={}, category={}, sku={}",
            request.name, request.brand, request.category, request.sku
        );

        let valid = self.validate(request).await?;
        let validation_duration = start.elapsed();

        let product = new_product(valid, self.clock.now_utc());
        let save_start = Instant::now();
        match self.db.add_product(&product).await {
            Ok(()) => (),
            Err(DbError::AlreadyExists) => {
                warn!("Lost race to create product with SKU {}", product.sku());
                return Err(DriverError::AlreadyExists(format!(
                    "SKU {} must be unique: already exists",
                    product.sku()
                )));
            }
            Err(e) => return Err(e.into()),
        }
        let save_duration = save_start.elapsed();

        self.cache.invalidate_category(*product.category()).await;

        info!("Created product {} with SKU {}", product.id(), product.sku());
        debug!(
            "Product {} creation timings: validation={:?}, save={:?}, total={:?}",
            product.sku(),
            validation_duration,
            save_duration,
            start.elapsed()
        );

        Ok(product_view(&product, self.clock.today_utc()))
    }
}

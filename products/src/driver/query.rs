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

//! Queries over the catalog.

use crate::driver::Driver;
use crate::driver::mapping::product_view;
use crate::model::*;
use catalog_core::driver::DriverResult;

impl Driver {
    /// Gets the views of all products in `category`, sorted by SKU.
    pub async fn get_by_category(self, category: Category) -> DriverResult<Vec<ProductView>> {
        let products = self.cache.get_by_category(self.db.as_ref(), category).await?;
        let today = self.clock.today_utc();
        Ok(products.iter().map(|p| product_view(p, today)).collect())
    }

    /// Gets the views of all products, sorted by SKU.
    pub async fn get_products(self) -> DriverResult<Vec<ProductView>> {
        let products = self.cache.get_all(self.db.as_ref()).await?;
        let today = self.clock.today_utc();
        Ok(products.iter().map(|p| product_view(p, today)).collect())
    }
}

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

//! High-level data types.
//!
//! Input data enters the system as a `NewProduct`, whose fields are kept in their raw form so that
//! the business rules can report every problem at once.  Once a request passes validation, its
//! fields are converted to the typed representations in this module (`Sku`, `Category`, etc.) and
//! the request becomes a stored `Product`.  Products are never shown to callers directly: they are
//! rendered into a `ProductView` with all derived fields computed at read time.

mod batch;
pub use batch::{BatchItem, BatchRequest, BatchResult};
mod category;
pub use category::Category;
mod metrics;
pub use metrics::{CategoryMetrics, ProductMetrics, TopProduct};
mod product;
pub use product::{NewProduct, Product, ProductId, ProductView, Sku};
pub(crate) use product::ValidNewProduct;

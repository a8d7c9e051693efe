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

//! Entry point to the batch import tool.
//!
//! Reads a JSON batch request from stdin, creates all products in it against an in-memory
//! catalog and prints the batch result followed by the inventory metrics as JSON.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use catalog_core::clocks::SystemClock;
use catalog_products::cache::{CategoryCache, CategoryCacheOptions};
use catalog_products::db::MemoryProductsDb;
use catalog_products::driver::{Driver, DriverOptions};
use catalog_products::model::BatchRequest;
use log::{info, warn};
use std::io;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cache_opts = CategoryCacheOptions::from_env("CATALOG_CACHE").unwrap();
    let driver_opts = DriverOptions::from_env("CATALOG").unwrap();

    let request: BatchRequest =
        serde_json::from_reader(io::stdin().lock()).expect("Invalid batch request in stdin");

    let driver = Driver::new(
        Arc::new(MemoryProductsDb::new()),
        Arc::new(SystemClock::default()),
        CategoryCache::new(cache_opts),
        driver_opts,
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupted; cancelling pending products");
                    cancel.cancel();
                }
                Err(e) => warn!("Cannot listen for interrupts: {}", e),
            }
        });
    }

    let result = driver.clone().create_batch(request, cancel).await.unwrap();
    println!("{}", serde_json::to_string_pretty(&result).unwrap());

    let metrics = driver.get_metrics().await.unwrap();
    println!("{}", serde_json::to_string_pretty(&metrics).unwrap());
}

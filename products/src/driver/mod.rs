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

//! Business logic for the product catalog.

use crate::cache::CategoryCache;
use crate::db::ProductsDb;
use catalog_core::clocks::Clock;
use catalog_core::env::get_optional_var;
use std::sync::Arc;

mod batch;
mod create;
mod mapping;
mod metrics;
mod query;
#[cfg(test)]
mod testutils;
mod validation;

/// Default value for the `DAILY_CREATION_LIMIT` setting when not specified.
const DEFAULT_DAILY_CREATION_LIMIT: usize = 500;

/// Configuration options for the catalog driver.
#[derive(Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct DriverOptions {
    /// Maximum number of products that can be created on a single UTC calendar day.
    pub daily_creation_limit: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self { daily_creation_limit: DEFAULT_DAILY_CREATION_LIMIT }
    }
}

impl DriverOptions {
    /// Creates a new set of options from environment variables.
    ///
    /// This will use variables such as `<prefix>_DAILY_CREATION_LIMIT`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            daily_creation_limit: get_optional_var::<usize>(prefix, "DAILY_CREATION_LIMIT")?
                .unwrap_or(DEFAULT_DAILY_CREATION_LIMIT),
        })
    }
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot" so they consume the driver.
/// Callers that need to issue more than one operation, like the batch orchestrator, must clone
/// the driver, which is cheap.
#[derive(Clone)]
pub struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn ProductsDb + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Cache of product listings.
    cache: CategoryCache,

    /// Options for the driver.
    opts: DriverOptions,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub fn new(
        db: Arc<dyn ProductsDb + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        cache: CategoryCache,
        opts: DriverOptions,
    ) -> Self {
        Self { db, clock, cache, opts }
    }
}

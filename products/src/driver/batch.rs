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

//! Creation of products in batches.

use crate::driver::Driver;
use crate::model::*;
use catalog_core::driver::{DriverError, DriverResult};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Error message recorded for items that were not started because the batch was cancelled.
const CANCELLED_ITEM_MESSAGE: &str = "Batch was cancelled before this item was processed";

/// Generates a short identifier to correlate the log entries of one batch.
fn new_operation_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Computes how many items of a batch of `total` items may be processed at once.
fn effective_parallelism(request: &BatchRequest, total: usize) -> usize {
    if !request.parallel || total <= 1 {
        1
    } else {
        request.max_parallelism.min(num_cpus::get()).max(1)
    }
}

impl Driver {
    /// Creates the `index`th product of batch `operation_id` from `request`.
    ///
    /// The creation runs in its own task so that a panic is recorded as a failure of this item
    /// only.
    async fn create_batch_item(
        self,
        operation_id: &str,
        index: usize,
        request: NewProduct,
    ) -> BatchItem {
        let start = Instant::now();
        match tokio::spawn(self.create_product(request)).await {
            Ok(Ok(view)) => BatchItem::succeeded(index, view, start.elapsed()),
            Ok(Err(e)) => {
                warn!("Batch {}: item {} failed: {}", operation_id, index, e);
                BatchItem::failed(index, e.to_string(), start.elapsed())
            }
            Err(e) => {
                warn!("Batch {}: item {} crashed: {}", operation_id, index, e);
                BatchItem::failed(index, format!("Unexpected error: {}", e), start.elapsed())
            }
        }
    }

    /// Creates all products in `request`, recording the outcome of each one independently.
    ///
    /// Once `cancel` fires, items that have not yet started are recorded as failures while items
    /// in flight run to completion.  The batch as a whole only fails if it is cancelled before
    /// any item starts.
    pub async fn create_batch(
        self,
        request: BatchRequest,
        cancel: CancellationToken,
    ) -> DriverResult<BatchResult> {
        let operation_id = new_operation_id();
        let total = request.products.len();
        if total > 0 && cancel.is_cancelled() {
            info!("Batch {}: cancelled before start", operation_id);
            return Err(DriverError::Cancelled(format!(
                "Batch {} was cancelled before processing any item",
                operation_id
            )));
        }

        let parallelism = effective_parallelism(&request, total);
        info!(
            "Batch {}: creating {} products (parallel={}, parallelism={})",
            operation_id, total, request.parallel, parallelism
        );

        let start = Instant::now();
        let results = stream::iter(request.products.into_iter().enumerate())
            .map(|(index, product)| {
                let driver = self.clone();
                let cancel = cancel.clone();
                let operation_id = operation_id.as_str();
                async move {
                    if cancel.is_cancelled() {
                        return BatchItem::failed(index, CANCELLED_ITEM_MESSAGE, Duration::ZERO);
                    }
                    driver.create_batch_item(operation_id, index, product).await
                }
            })
            .buffer_unordered(parallelism)
            .collect::<Vec<BatchItem>>()
            .await;

        let result = BatchResult::new(results, start.elapsed(), self.clock.now_utc());
        if cancel.is_cancelled() {
            info!("Batch {}: cancelled while in progress", operation_id);
        }
        info!(
            "Batch {}: completed with {} successes and {} failures in {:?}",
            operation_id,
            result.success_count(),
            result.failure_count(),
            result.total_duration()
        );
        Ok(result)
    }
}

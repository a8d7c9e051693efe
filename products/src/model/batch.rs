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

//! Data types for batch creation of products.

use crate::model::{NewProduct, ProductView};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;

/// Default value of `BatchRequest::parallel` when not specified.
fn default_parallel() -> bool {
    true
}

/// Default value of `BatchRequest::max_parallelism` when not specified.
fn default_max_parallelism() -> usize {
    4
}

/// Request to create a list of products in one operation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BatchRequest {
    /// Products to create, in the order in which results are reported.
    pub products: Vec<NewProduct>,

    /// Whether to process the products concurrently.
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Upper bound on the number of products processed at once when `parallel` is set.
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,
}

impl BatchRequest {
    /// Creates a new parallel batch request with default settings for `products`.
    pub fn new(products: Vec<NewProduct>) -> Self {
        Self { products, parallel: default_parallel(), max_parallelism: default_max_parallelism() }
    }
}

/// Outcome of processing one item of a batch.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
pub struct BatchItem {
    /// Position of the item in the original request.
    pub(crate) index: usize,

    /// Whether the product was created.
    pub(crate) success: bool,

    /// The created product, present iff `success` is true.
    pub(crate) product: Option<ProductView>,

    /// Reason for the failure, present iff `success` is false.
    pub(crate) error: Option<String>,

    /// Time spent processing this item.
    pub(crate) processing_duration: Duration,
}

impl BatchItem {
    /// Creates a successful item.
    pub(crate) fn succeeded(index: usize, product: ProductView, duration: Duration) -> Self {
        Self { index, success: true, product: Some(product), error: None, processing_duration: duration }
    }

    /// Creates a failed item.
    pub(crate) fn failed<S: Into<String>>(index: usize, error: S, duration: Duration) -> Self {
        Self {
            index,
            success: false,
            product: None,
            error: Some(error.into()),
            processing_duration: duration,
        }
    }
}

/// Outcome of processing a whole batch.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
pub struct BatchResult {
    /// Number of items in the request.
    pub(crate) total_requests: usize,

    /// Number of items that were created.
    pub(crate) success_count: usize,

    /// Number of items that failed.
    pub(crate) failure_count: usize,

    /// Wall time spent processing the whole batch.
    pub(crate) total_duration: Duration,

    /// Per-item outcomes, sorted by `index`.
    pub(crate) results: Vec<BatchItem>,

    /// Moment at which processing finished.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) processed_at: OffsetDateTime,
}

impl BatchResult {
    /// Builds a result from the per-item outcomes, sorting them and computing the counters.
    pub(crate) fn new(
        mut results: Vec<BatchItem>,
        total_duration: Duration,
        processed_at: OffsetDateTime,
    ) -> Self {
        results.sort_by_key(|item| item.index);
        let success_count = results.iter().filter(|item| item.success).count();
        Self {
            total_requests: results.len(),
            success_count,
            failure_count: results.len() - success_count,
            total_duration,
            results,
            processed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_batch_request_de_defaults() {
        let request: BatchRequest = serde_json::from_str(r#"{"products": []}"#).unwrap();
        assert_eq!(BatchRequest::new(vec![]), request);
        assert!(request.parallel);
        assert_eq!(4, request.max_parallelism);
    }

    #[test]
    fn test_batch_request_de_explicit() {
        let request: BatchRequest =
            serde_json::from_str(r#"{"products": [], "parallel": false, "max_parallelism": 9}"#)
                .unwrap();
        assert!(!request.parallel);
        assert_eq!(9, request.max_parallelism);
    }

    #[test]
    fn test_batch_result_new_sorts_and_counts() {
        let now = datetime!(2024-06-15 12:00:00 UTC);
        let result = BatchResult::new(
            vec![
                BatchItem::failed(2, "bad", Duration::from_millis(3)),
                BatchItem::failed(0, "worse", Duration::from_millis(1)),
                BatchItem::failed(1, "worst", Duration::from_millis(2)),
            ],
            Duration::from_millis(10),
            now,
        );
        assert_eq!(3, result.total_requests);
        assert_eq!(0, result.success_count);
        assert_eq!(3, result.failure_count);
        assert_eq!(
            vec![0, 1, 2],
            result.results.iter().map(|item| item.index).collect::<Vec<usize>>()
        );
        assert_eq!(Some("worse".to_owned()), result.results[0].error);
        assert_eq!(now, result.processed_at);
    }
}

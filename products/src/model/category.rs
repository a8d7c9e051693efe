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

//! The `Category` data type.

use catalog_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Product categories known to the catalog.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Category {
    /// Electronic devices and accessories.
    Electronics,

    /// Apparel and accessories.
    Clothing,

    /// Books and other printed media.
    Books,

    /// Furniture and household goods.
    Home,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Category; 4] =
        [Category::Electronics, Category::Clothing, Category::Books, Category::Home];

    /// Returns the canonical name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::Books => "Books",
            Category::Home => "Home",
        }
    }

    /// Returns the human-readable label to show to users.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Electronics => "Electronics & Technology",
            Category::Clothing => "Clothing & Fashion",
            Category::Books => "Books & Media",
            Category::Home => "Home & Garden",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    /// Parses a category from its canonical name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> ModelResult<Self> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError(format!("Unknown category '{}'", s)))
    }
}

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

//! Product data types: the creation request, the stored record and its rendered view.

use crate::model::Category;
use catalog_core::model::{ModelError, ModelResult};
use derive_getters::Getters;
use derive_more::{AsRef, Display};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::sync::LazyLock;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Pattern that every SKU must match.
static SKU_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9\-]{5,20}$").expect("Hardcoded SKU pattern must be valid")
});

/// Default stock quantity for requests that do not specify one.
fn default_stock_quantity() -> i64 {
    1
}

/// Opaque and immutable identifier of a stored product.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Generates a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

/// Represents a correctly-formatted (but maybe already taken) stock keeping unit.
///
/// SKUs are case sensitive: `ABC-123` and `abc-123` are different products.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Creates a new SKU from an untrusted string `s`, making sure it is valid.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if !SKU_PATTERN.is_match(&s) {
            return Err(ModelError(format!(
                "SKU '{}' must be alphanumeric with hyphens, 5..20 length",
                s
            )));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the SKU.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Allows looking up SKU-keyed collections with plain strings.  Ordering and equality of `Sku`
/// are those of its string, which keeps lookups consistent.
impl Borrow<str> for Sku {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Request to add a new product to the catalog.
///
/// Fields are kept in their raw form because the business rules need to look at possibly-invalid
/// values to report all problems with a request in one go.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NewProduct {
    /// Name of the product.
    pub name: String,

    /// Brand that manufactures the product.
    pub brand: String,

    /// Unique stock keeping unit.
    pub sku: String,

    /// Name of the category the product belongs to.
    pub category: String,

    /// Unit price in US dollars.
    pub price: Decimal,

    /// Day on which the product was first released.
    pub release_date: Date,

    /// Optional absolute HTTP(S) link to a picture of the product.
    #[serde(default)]
    pub image_url: Option<String>,

    /// Number of units in stock.  Signed so that negative inputs can be reported.
    #[serde(default = "default_stock_quantity")]
    pub stock_quantity: i64,
}

/// A `NewProduct` that passed all business rules, with its fields converted to their typed form.
#[derive(Debug)]
pub(crate) struct ValidNewProduct {
    /// Name of the product.
    pub(crate) name: String,

    /// Brand that manufactures the product.
    pub(crate) brand: String,

    /// Unique stock keeping unit.
    pub(crate) sku: Sku,

    /// Category the product belongs to.
    pub(crate) category: Category,

    /// Unit price in US dollars.
    pub(crate) price: Decimal,

    /// Day on which the product was first released.
    pub(crate) release_date: Date,

    /// Optional link to a picture of the product, as written by the caller.
    pub(crate) image_url: Option<String>,

    /// Number of units in stock.
    pub(crate) stock_quantity: u32,
}

/// A product as kept in the store.
#[derive(Clone, Debug, Getters, PartialEq)]
pub struct Product {
    /// Identifier assigned at creation time.
    pub(crate) id: ProductId,

    /// Name of the product.
    pub(crate) name: String,

    /// Brand that manufactures the product.
    pub(crate) brand: String,

    /// Globally-unique stock keeping unit.
    pub(crate) sku: Sku,

    /// Category the product belongs to.
    pub(crate) category: Category,

    /// Unit price in US dollars, before any category discount.
    pub(crate) price: Decimal,

    /// Day on which the product was first released.
    pub(crate) release_date: Date,

    /// Optional link to a picture of the product, as written by the caller.
    pub(crate) image_url: Option<String>,

    /// Number of units in stock.
    pub(crate) stock_quantity: u32,

    /// Whether there is stock left.  Always equal to `stock_quantity > 0`.
    pub(crate) is_available: bool,

    /// Moment at which the product was inserted into the store.
    pub(crate) created_at: OffsetDateTime,

    /// Moment of the last modification, if any.
    pub(crate) updated_at: Option<OffsetDateTime>,
}

impl Product {
    /// Returns the value of the inventory held for this product.
    pub fn inventory_value(&self) -> Decimal {
        self.price * Decimal::from(self.stock_quantity)
    }
}

/// Representation of a product for callers, including all derived fields.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
pub struct ProductView {
    /// Identifier of the product.
    pub(crate) id: ProductId,

    /// Name of the product.
    pub(crate) name: String,

    /// Brand that manufactures the product.
    pub(crate) brand: String,

    /// Stock keeping unit.
    pub(crate) sku: Sku,

    /// Human-readable label of the category.
    pub(crate) category_display_name: String,

    /// Price to charge, after applying any category discount.
    pub(crate) price: Decimal,

    /// `price` rendered as a US dollar amount.
    pub(crate) formatted_price: String,

    /// Day on which the product was first released.
    pub(crate) release_date: Date,

    /// Moment at which the product was inserted into the store.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,

    /// Link to a picture of the product, if it can be shown.
    pub(crate) image_url: Option<String>,

    /// Whether there is stock left.
    pub(crate) is_available: bool,

    /// Number of units in stock.
    pub(crate) stock_quantity: u32,

    /// Label describing how long ago the product was released.
    pub(crate) product_age: String,

    /// Initials of the brand.
    pub(crate) brand_initials: String,

    /// Label describing how much stock is left.
    pub(crate) availability_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_test::{Token, assert_ser_tokens};
    use time::macros::date;

    #[test]
    fn test_sku_ok() {
        assert_eq!("ABCDE", Sku::new("ABCDE").unwrap().as_str());
        assert_eq!("TECH-LAPTOP-001", Sku::new("TECH-LAPTOP-001").unwrap().as_str());
        assert_eq!("a1-b2-c3-d4-e5-f6-g7", Sku::new("a1-b2-c3-d4-e5-f6-g7").unwrap().as_str());
    }

    #[test]
    fn test_sku_error() {
        assert!(Sku::new("").is_err());
        assert!(Sku::new("ABCD").is_err());
        assert!(Sku::new("ABC DE").is_err());
        assert!(Sku::new("ABC_DE").is_err());
        assert!(Sku::new("ABCDE\u{00e9}").is_err());
        assert!(Sku::new("123456789012345678901").is_err());
        assert_eq!(
            ModelError("SKU 'AB' must be alphanumeric with hyphens, 5..20 length".to_owned()),
            Sku::new("AB").unwrap_err()
        );
    }

    #[test]
    fn test_sku_lookup_by_str() {
        let mut skus = std::collections::BTreeMap::new();
        skus.insert(Sku::new("ABC-123").unwrap(), 1);
        skus.insert(Sku::new("abc-123").unwrap(), 2);
        assert_eq!(Some(&1), skus.get("ABC-123"));
        assert_eq!(Some(&2), skus.get("abc-123"));
        assert_eq!(None, skus.get("ABC-1234"));
    }

    #[test]
    fn test_sku_ser() {
        assert_ser_tokens(&Sku::new("SKU-00001").unwrap(), &[Token::Str("SKU-00001")]);
    }

    #[test]
    fn test_product_ids_are_unique() {
        assert_ne!(ProductId::new(), ProductId::new());
    }

    #[test]
    fn test_new_product_de_defaults() {
        let raw = r#"{
            "name": "Paperback",
            "brand": "Acme",
            "sku": "BOOK-00001",
            "category": "Books",
            "price": "12.5",
            "release_date": "2020-02-29"
        }"#;
        let product: NewProduct = serde_json::from_str(raw).unwrap();
        assert_eq!(dec!(12.5), product.price);
        assert_eq!(date!(2020 - 02 - 29), product.release_date);
        assert_eq!(None, product.image_url);
        assert_eq!(1, product.stock_quantity);
    }
}

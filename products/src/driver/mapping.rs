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

//! Derivation of stored records from requests and of views from stored records.

use crate::model::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use rusty_money::{Money, iso};
use time::{Date, OffsetDateTime};

/// Multiplier applied to the price of Home products when presenting them.
const HOME_PRICE_FACTOR: Decimal = dec!(0.9);

/// Number of days after release during which a product is considered new.
const NEW_RELEASE_DAYS: i64 = 30;

/// Number of days in a year, for the purposes of age computations.
const DAYS_PER_YEAR: i64 = 365;

/// Exact age in days at which a product becomes a classic.
const CLASSIC_DAYS: i64 = 5 * DAYS_PER_YEAR;

/// Builds the record to store for a validated request.
pub(crate) fn new_product(request: ValidNewProduct, now: OffsetDateTime) -> Product {
    Product {
        id: ProductId::new(),
        name: request.name,
        brand: request.brand,
        sku: request.sku,
        category: request.category,
        price: request.price,
        release_date: request.release_date,
        image_url: request.image_url,
        stock_quantity: request.stock_quantity,
        is_available: request.stock_quantity > 0,
        created_at: now,
        updated_at: None,
    }
}

/// Computes the price to present for a product of `category` listed at `price`.
fn display_price(category: Category, price: Decimal) -> Decimal {
    match category {
        Category::Home => (price * HOME_PRICE_FACTOR).round_dp(2),
        _ => price,
    }
}

/// Renders `price` as a US dollar amount.
fn format_price(price: Decimal) -> String {
    Money::from_decimal(price, iso::USD).to_string()
}

/// Describes how long ago `release_date` was as of `today`.
fn product_age(release_date: Date, today: Date) -> String {
    let days = (today - release_date).whole_days();
    if days < NEW_RELEASE_DAYS {
        "New Release".to_owned()
    } else if days < DAYS_PER_YEAR {
        format!("{} months old", days / 30)
    } else if days == CLASSIC_DAYS {
        "Classic".to_owned()
    } else {
        format!("{} years old", days / DAYS_PER_YEAR)
    }
}

/// Returns the uppercase form of the first letter of `word`.
fn first_letter(word: &str) -> String {
    word.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default()
}

/// Computes the initials of `brand`: the first letter of its first and last words.
fn brand_initials(brand: &str) -> String {
    let words = brand.split_whitespace().collect::<Vec<&str>>();
    match words.as_slice() {
        [] => "?".to_owned(),
        [word] => first_letter(word),
        [first, .., last] => first_letter(first) + &first_letter(last),
    }
}

/// Describes the stock situation of a product.
fn availability_status(is_available: bool, stock_quantity: u32) -> &'static str {
    if !is_available {
        "Out of Stock"
    } else if stock_quantity == 0 {
        "Unavailable"
    } else if stock_quantity == 1 {
        "Last Item"
    } else if stock_quantity <= 5 {
        "Limited Stock"
    } else {
        "In Stock"
    }
}

/// Builds the view of `product` as of `today`.
pub(crate) fn product_view(product: &Product, today: Date) -> ProductView {
    let price = display_price(product.category, product.price);
    let image_url = match product.category {
        Category::Home => None,
        _ => product.image_url.clone(),
    };
    ProductView {
        id: product.id,
        name: product.name.clone(),
        brand: product.brand.clone(),
        sku: product.sku.clone(),
        category_display_name: product.category.display_name().to_owned(),
        price,
        formatted_price: format_price(price),
        release_date: product.release_date,
        created_at: product.created_at,
        image_url,
        is_available: product.is_available,
        stock_quantity: product.stock_quantity,
        product_age: product_age(product.release_date, today),
        brand_initials: brand_initials(&product.brand),
        availability_status: availability_status(product.is_available, product.stock_quantity)
            .to_owned(),
    }
}

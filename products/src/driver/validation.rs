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

//! Business rules that gate the creation of products.
//!
//! Every rule is a pure function that inspects a creation request together with a snapshot of
//! the catalog and returns the messages for the violations it finds, if any.  All rules run on
//! every request so that callers learn about every problem at once.

use crate::driver::Driver;
use crate::model::*;
use catalog_core::driver::{DriverError, DriverResult};
use log::warn;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::LazyLock;
use time::macros::date;
use time::{Date, Month};
use url::Url;

/// Words that may not appear in any product name.
const INAPPROPRIATE_WORDS: &[&str] = &["offensive", "nsfw", "obscene", "vulgar"];

/// Words that may not appear in the name of Home products.
const HOME_RESTRICTED_WORDS: &[&str] = &["weapon", "explosive", "toxic", "hazard"];

/// Additional words that make a name unsuitable for Home products.
const HOME_EXTRA_INAPPROPRIATE_WORDS: &[&str] = &["violence", "adult", "nsfw"];

/// Keywords of which Electronics names must contain at least one.
const TECH_KEYWORDS: &[&str] = &[
    "tech",
    "smart",
    "ai",
    "ml",
    "gpu",
    "cpu",
    "processor",
    "chip",
    "ssd",
    "nvme",
    "wireless",
    "bluetooth",
    "usb-c",
    "hdmi",
    "4k",
    "8k",
    "oled",
    "lcd",
    "monitor",
    "laptop",
    "notebook",
    "desktop",
    "headphones",
    "earbuds",
    "camera",
    "router",
    "wifi",
    "gaming",
    "controller",
    "console",
    "keyboard",
    "mouse",
    "battery",
    "charger",
    "dock",
];

/// Extensions accepted at the end of image URL paths.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Pattern that every brand must match.
static BRAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9\s\-.'\u{2019}]+$").expect("Hardcoded brand pattern must be valid")
});

/// Earliest acceptable release date.
const MIN_RELEASE_DATE: Date = date!(1900 - 01 - 01);

/// Number of years within which Electronics must have been released.
const ELECTRONICS_RECENCY_YEARS: i32 = 5;

/// Prices must be strictly below this amount.
const MAX_PRICE: Decimal = dec!(10000);

/// Maximum number of units that can be held in stock.
const MAX_STOCK_QUANTITY: i64 = 100_000;

/// Minimum price of Electronics.
const ELECTRONICS_MIN_PRICE: Decimal = dec!(50);

/// Maximum price of Home products.
const HOME_MAX_PRICE: Decimal = dec!(200);

/// Price above which `EXPENSIVE_MAX_STOCK` applies.
const EXPENSIVE_PRICE: Decimal = dec!(100);

/// Maximum stock of products priced above `EXPENSIVE_PRICE`.
const EXPENSIVE_MAX_STOCK: i64 = 20;

/// Price above which `HIGH_VALUE_MAX_STOCK` applies.
const HIGH_VALUE_PRICE: Decimal = dec!(500);

/// Maximum stock of products priced above `HIGH_VALUE_PRICE`.
const HIGH_VALUE_MAX_STOCK: i64 = 10;

/// Everything the rules need to know to judge a creation request.
pub(crate) struct RuleContext<'a> {
    /// The request being validated.
    pub(crate) request: &'a NewProduct,

    /// The category named by the request, if it is valid.
    pub(crate) category: Option<Category>,

    /// The current UTC calendar day.
    pub(crate) today: Date,

    /// Snapshot of all stored products.
    pub(crate) existing: &'a [Product],

    /// Whether the SKU of the request is already taken.
    pub(crate) sku_taken: bool,

    /// Maximum number of products that can be created per day.
    pub(crate) daily_creation_limit: usize,
}

/// A business rule.
type Rule = fn(&RuleContext<'_>) -> Vec<String>;

/// All business rules in evaluation order.
const RULES: &[Rule] = &[
    name_rules,
    brand_rules,
    sku_rules,
    category_rules,
    price_rules,
    release_date_rules,
    stock_quantity_rules,
    image_url_rules,
    category_specific_rules,
    cross_field_rules,
    aggregate_rules,
];

/// Returns true if the lowercase version of `s` contains any of `words`.
fn contains_any(s: &str, words: &[&str]) -> bool {
    let s = s.to_lowercase();
    words.iter().any(|w| s.contains(w))
}

/// Returns true if `date` is no earlier than `years` years before `today`.
fn released_within_years(date: Date, today: Date, years: i32) -> bool {
    let year = today.year() - years;
    let limit = today
        .replace_year(year)
        .or_else(|_| Date::from_calendar_date(year, Month::February, 28))
        .unwrap_or(Date::MIN);
    date >= limit
}

/// Parses `raw` as an absolute HTTP(S) URL whose path ends in a known image extension.
///
/// The parsed form is only used for checking: callers keep `raw` as the value to store.
fn parse_image_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    let file = url.path().rsplit('/').next().unwrap_or("");
    let (_, ext) = file.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) { Some(url) } else { None }
}

/// Returns the image URL of `request` if it carries a non-blank one.
fn raw_image_url(request: &NewProduct) -> Option<&str> {
    request.image_url.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Checks the name's length and content, and that its brand has no product with the same name.
fn name_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    let name = &ctx.request.name;
    let mut errors = vec![];
    if name.trim().is_empty() {
        errors.push("Name is required.".to_owned());
    }
    let length = name.chars().count();
    if !(1..=200).contains(&length) {
        errors.push("Name length must be 1..200.".to_owned());
    }
    if !name.trim().is_empty() && contains_any(name, INAPPROPRIATE_WORDS) {
        errors.push("Name contains inappropriate content.".to_owned());
    }
    let taken = ctx.existing.iter().any(|p| {
        p.name().to_lowercase() == name.to_lowercase()
            && p.brand().to_lowercase() == ctx.request.brand.to_lowercase()
    });
    if taken {
        errors.push("Name must be unique per brand.".to_owned());
    }
    errors
}

/// Checks the brand's length and allowed characters.
fn brand_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    let brand = &ctx.request.brand;
    let mut errors = vec![];
    if brand.trim().is_empty() {
        errors.push("Brand is required.".to_owned());
    }
    let length = brand.chars().count();
    if !(2..=100).contains(&length) {
        errors.push("Brand length must be 2..100.".to_owned());
    }
    if !BRAND_PATTERN.is_match(brand) {
        errors.push("Brand contains invalid characters.".to_owned());
    }
    errors
}

/// Checks the SKU's format and that no stored product uses it yet.
fn sku_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    let sku = &ctx.request.sku;
    let mut errors = vec![];
    if sku.trim().is_empty() {
        errors.push("SKU is required.".to_owned());
    }
    if Sku::new(sku.as_str()).is_err() {
        errors.push("SKU must be alphanumeric with hyphens, 5..20 length.".to_owned());
    }
    if ctx.sku_taken {
        errors.push("SKU must be unique.".to_owned());
    }
    errors
}

/// Checks that the category names one of the known categories.
fn category_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    match ctx.category {
        Some(_) => vec![],
        None => vec!["Category is invalid.".to_owned()],
    }
}

/// Checks that the price is positive and below the catalog maximum.
fn price_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    let price = ctx.request.price;
    let mut errors = vec![];
    if price <= Decimal::ZERO {
        errors.push("Price must be greater than 0.".to_owned());
    }
    if price >= MAX_PRICE {
        errors.push("Price must be less than 10000.".to_owned());
    }
    errors
}

/// Checks that the release date is neither in the future nor before 1900.
fn release_date_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    let release_date = ctx.request.release_date;
    let mut errors = vec![];
    if release_date > ctx.today {
        errors.push("ReleaseDate cannot be in the future.".to_owned());
    }
    if release_date < MIN_RELEASE_DATE {
        errors.push("ReleaseDate cannot be before 1900.".to_owned());
    }
    errors
}

/// Checks that the stock quantity is within 0..=100000.
fn stock_quantity_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    let stock = ctx.request.stock_quantity;
    let mut errors = vec![];
    if stock < 0 {
        errors.push("StockQuantity cannot be negative.".to_owned());
    }
    if stock > MAX_STOCK_QUANTITY {
        errors.push("StockQuantity cannot exceed 100000.".to_owned());
    }
    errors
}

/// Checks that a non-blank image URL is an HTTP(S) link to an image file.
fn image_url_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    match raw_image_url(ctx.request) {
        Some(raw) if parse_image_url(raw).is_none() => {
            vec!["ImageUrl must be HTTP/HTTPS and end with a valid image extension.".to_owned()]
        }
        _ => vec![],
    }
}

/// Checks the constraints that only apply to some categories.
fn category_specific_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    let request = ctx.request;
    let mut errors = vec![];
    match ctx.category {
        Some(Category::Electronics) => {
            if request.price < ELECTRONICS_MIN_PRICE {
                errors.push("Electronics price must be at least $50.00.".to_owned());
            }
            if !contains_any(&request.name, TECH_KEYWORDS) {
                errors.push("Electronics Name must contain technology keywords.".to_owned());
            }
            if !released_within_years(request.release_date, ctx.today, ELECTRONICS_RECENCY_YEARS)
            {
                errors.push("Electronics must be released within the last 5 years.".to_owned());
            }
        }
        Some(Category::Home) => {
            if request.price > HOME_MAX_PRICE {
                errors.push("Home product price must be at most $200.00.".to_owned());
            }
            let appropriate = !request.name.trim().is_empty()
                && !contains_any(&request.name, INAPPROPRIATE_WORDS)
                && !contains_any(&request.name, HOME_RESTRICTED_WORDS)
                && !contains_any(&request.name, HOME_EXTRA_INAPPROPRIATE_WORDS);
            if !appropriate {
                errors.push("Home product Name is not appropriate.".to_owned());
            }
        }
        Some(Category::Clothing) => {
            if request.brand.trim().chars().count() < 3 {
                errors.push("Clothing Brand must be at least 3 characters.".to_owned());
            }
        }
        Some(Category::Books) | None => (),
    }
    errors
}

/// Checks constraints that relate several fields of the request to each other.
fn cross_field_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    let request = ctx.request;
    let mut errors = vec![];
    if request.price > EXPENSIVE_PRICE && request.stock_quantity > EXPENSIVE_MAX_STOCK {
        errors.push("Expensive products (> $100) must have limited stock (≤ 20 units).".to_owned());
    }
    if ctx.category == Some(Category::Electronics)
        && !released_within_years(request.release_date, ctx.today, ELECTRONICS_RECENCY_YEARS)
    {
        errors.push("Electronics must be recent (released within 5 years).".to_owned());
    }
    errors
}

/// Checks limits that depend on the existing catalog, such as the daily creation limit.
fn aggregate_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    let request = ctx.request;
    let mut errors = vec![];

    let created_today =
        ctx.existing.iter().filter(|p| p.created_at().date() == ctx.today).count();
    if created_today >= ctx.daily_creation_limit {
        warn!("Daily limit exceeded: {}", created_today);
        errors.push(format!(
            "Daily product addition limit reached ({}).",
            ctx.daily_creation_limit
        ));
    }

    if ctx.category == Some(Category::Electronics) && request.price < ELECTRONICS_MIN_PRICE {
        warn!("Electronics minimum price violated: {}", request.price);
        errors.push("Electronics must be priced at least $50.00.".to_owned());
    }

    if ctx.category == Some(Category::Home) && contains_any(&request.name, HOME_RESTRICTED_WORDS) {
        warn!("Home content restriction violated: {}", request.name);
        errors.push("Home category has restricted content in Name.".to_owned());
    }

    if request.price > HIGH_VALUE_PRICE && request.stock_quantity > HIGH_VALUE_MAX_STOCK {
        warn!(
            "High value stock limit violated: price {} with stock {}",
            request.price, request.stock_quantity
        );
        errors.push("High-value product stock limit: max 10 units for price > $500.".to_owned());
    }

    errors
}

/// Runs all business rules against `ctx` and returns the violations in evaluation order.
pub(crate) fn check_rules(ctx: &RuleContext<'_>) -> Vec<String> {
    RULES.iter().flat_map(|rule| rule(ctx)).collect()
}

/// Converts a `request` that passed all rules into its typed form.
fn into_valid(request: NewProduct, category: Category) -> DriverResult<ValidNewProduct> {
    let image_url = match raw_image_url(&request) {
        Some(raw) if parse_image_url(raw).is_none() => {
            return Err(DriverError::InvalidInput(format!("Invalid image URL '{}'", raw)));
        }
        Some(raw) => Some(raw.to_owned()),
        None => None,
    };
    let stock_quantity = u32::try_from(request.stock_quantity).map_err(|_| {
        DriverError::InvalidInput(format!("Invalid stock quantity {}", request.stock_quantity))
    })?;
    Ok(ValidNewProduct {
        sku: Sku::new(request.sku)?,
        name: request.name,
        brand: request.brand,
        category,
        price: request.price,
        release_date: request.release_date,
        image_url,
        stock_quantity,
    })
}

impl Driver {
    /// Checks `request` against all business rules and the current state of the catalog.
    ///
    /// Returns the typed version of the request on success or `ValidationFailed` with all the
    /// violations found.  Nothing is stored.
    pub(crate) async fn validate(&self, request: NewProduct) -> DriverResult<ValidNewProduct> {
        let existing = self.db.get_products().await?;
        let sku_taken = self.db.sku_exists(&request.sku).await?;
        let category = request.category.parse::<Category>().ok();

        let ctx = RuleContext {
            request: &request,
            category,
            today: self.clock.today_utc(),
            existing: &existing,
            sku_taken,
            daily_creation_limit: self.opts.daily_creation_limit,
        };
        let errors = check_rules(&ctx);

        match category {
            Some(category) if errors.is_empty() => into_valid(request, category),
            _ => {
                for error in &errors {
                    warn!("Validation error: {}", error);
                }
                Err(DriverError::ValidationFailed(errors))
            }
        }
    }
}

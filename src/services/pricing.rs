//! Order pricing: subtotal, weight-based shipping, tax and total.
//!
//! Everything here is a pure function of live catalog snapshots and the
//! store settings, so it can be exercised without a database.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::StoreSettings;

/// Weight covered by the base shipping rate.
const BASE_WEIGHT_GRAMS: i64 = 1_000;

/// One line as priced from the catalog, never from client input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: i64,
    pub quantity: i32,
    pub weight_grams: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Quote {
    pub subtotal: i64,
    pub weight_grams: i64,
    pub shipping_cost: i64,
    pub tax: i64,
    pub discount: i64,
    pub total: i64,
}

impl Quote {
    /// `total == subtotal + tax + shipping - discount`.
    pub fn is_consistent(&self) -> bool {
        self.total == self.subtotal + self.tax + self.shipping_cost - self.discount
    }
}

pub fn calculate(lines: &[PricedLine], settings: &StoreSettings, discount: i64) -> Quote {
    let subtotal: i64 = lines
        .iter()
        .map(|line| line.unit_price * i64::from(line.quantity))
        .sum();
    let weight_grams: i64 = lines
        .iter()
        .map(|line| i64::from(line.weight_grams) * i64::from(line.quantity))
        .sum();

    let shipping_cost = shipping_cost(subtotal, weight_grams, settings);
    let tax = tax_for(subtotal, settings.tax_percent);
    let discount = discount.clamp(0, subtotal);

    Quote {
        subtotal,
        weight_grams,
        shipping_cost,
        tax,
        discount,
        total: subtotal + tax + shipping_cost - discount,
    }
}

/// Free above the threshold; otherwise the base rate covers the first kilogram
/// and each started kilogram after that costs `per_kg_rate`.
pub fn shipping_cost(subtotal: i64, weight_grams: i64, settings: &StoreSettings) -> i64 {
    if subtotal >= settings.free_shipping_threshold {
        return 0;
    }
    settings.base_shipping_rate + extra_kilograms(weight_grams) * settings.per_kg_rate
}

fn extra_kilograms(weight_grams: i64) -> i64 {
    let over = weight_grams - BASE_WEIGHT_GRAMS;
    if over <= 0 {
        0
    } else {
        (over + BASE_WEIGHT_GRAMS - 1) / BASE_WEIGHT_GRAMS
    }
}

/// Rounded half away from zero to whole currency units.
pub fn tax_for(subtotal: i64, tax_percent: f64) -> i64 {
    (subtotal as f64 * tax_percent / 100.0).round() as i64
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

/// Sets the line's quantity; repeating a product replaces rather than adds.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Cart lines priced from the current catalog.
///
/// `subtotal` and `weight_grams` cover the whole cart, not just this page.
/// Shipping and tax are only worked out by the order quote.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartLine>,
    pub subtotal: i64,
    pub weight_grams: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
    pub line_total: i64,
    /// False when the shelf holds fewer units than the line asks for.
    pub available: bool,
}

impl CartLine {
    pub fn new(id: Uuid, product: Product, quantity: i32) -> Self {
        Self {
            id,
            line_total: product.price * i64::from(quantity),
            available: product.stock >= quantity,
            product,
            quantity,
        }
    }

    pub fn weight_grams(&self) -> i64 {
        i64::from(self.product.weight_grams) * i64::from(self.quantity)
    }
}

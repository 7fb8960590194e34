use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::validate_contact,
    error::{AppError, AppResult},
    models::{Order, OrderItem, OrderStatus, ShippingAddress},
    services::pricing::Quote,
};

const MAX_LINE_QUANTITY: i32 = 100;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LineItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Merge repeated products and reject empty or non-positive lines.
pub fn normalize_line_items(items: &[LineItemRequest]) -> AppResult<Vec<LineItemRequest>> {
    if items.is_empty() {
        return Err(AppError::BadRequest("order must contain at least one item".into()));
    }

    let mut merged: Vec<LineItemRequest> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".into(),
            ));
        }
        if item.quantity > MAX_LINE_QUANTITY {
            return Err(quantity_limit());
        }
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(quantity_limit)?;
            }
            None => merged.push(item.clone()),
        }
    }

    if merged
        .iter()
        .any(|m| m.quantity <= 0 || m.quantity > MAX_LINE_QUANTITY)
    {
        return Err(quantity_limit());
    }
    Ok(merged)
}

fn quantity_limit() -> AppError {
    AppError::BadRequest(format!(
        "quantity per product is limited to {MAX_LINE_QUANTITY}"
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<LineItemRequest>,
    pub shipping_address: ShippingAddress,
    /// Required for guest checkout; defaults to the signed-in customer's email.
    pub email: Option<String>,
    pub name: Option<String>,
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    pub fn validate_address(&self) -> AppResult<()> {
        let address = &self.shipping_address;
        let required = [
            &address.full_name,
            &address.phone,
            &address.line1,
            &address.city,
            &address.state,
            &address.postal_code,
            &address.country,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(AppError::BadRequest("shipping address is incomplete".into()));
        }
        if !address.postal_code.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-') {
            return Err(AppError::BadRequest("postal code is invalid".into()));
        }
        Ok(())
    }

    /// Contact details for the order: explicit fields first, then the account email.
    pub fn resolve_contact(&self, account_email: Option<&str>) -> AppResult<(String, String)> {
        let email = self
            .email
            .as_deref()
            .or(account_email)
            .ok_or_else(|| AppError::BadRequest("email is required for guest checkout".into()))?
            .trim()
            .to_lowercase();
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| self.shipping_address.full_name.clone());
        validate_contact(&email, &name)?;
        Ok((email, name.trim().to_string()))
    }
}

/// What the client needs to open the hosted payment sheet.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentIntent {
    pub gateway_order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: PaymentIntent,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    pub quote: Quote,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub note: Option<String>,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct SweepReport {
    pub cancelled: Vec<Uuid>,
    pub units_restored: i64,
    pub failed: Vec<Uuid>,
}

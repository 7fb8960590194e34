use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    cart_items, custom_orders, order_items, orders, products, store_settings, workshop_registrations,
    workshop_sessions, workshops,
};

/// Order lifecycle.
///
/// Forward path: `PENDING -> PROCESSING | CONFIRMED -> SHIPPED -> DELIVERED`.
/// `CANCELLED` is reachable from every non-terminal state and is never left.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PROCESSING")]
    Processing,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "SHIPPED")]
    Shipped,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Stock is reserved at creation and stays with the order until it ships or is cancelled.
    pub fn holds_reserved_stock(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Confirmed
        )
    }

    /// Transitions allowed outside of an admin override.
    pub fn can_advance_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (from, Cancelled) => !from.is_terminal(),
            (Pending, Processing | Confirmed) => true,
            (Processing, Confirmed | Shipped) => true,
            (Confirmed, Shipped) => true,
            (Shipped, Delivered) => true,
            _ => false,
        }
    }

    /// Admins may set any status with two exceptions: a cancellation cannot be
    /// undone, and goods that left the studio cannot go back to holding stock.
    pub fn admin_can_set(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            Cancelled => next == Cancelled,
            Shipped | Delivered => !next.holds_reserved_stock(),
            _ => true,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
        })
    }
}

/// Commission lifecycle: `PENDING -> QUOTED -> APPROVED -> PAID -> IN_PROGRESS -> COMPLETED`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomOrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "QUOTED")]
    Quoted,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl CustomOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomOrderStatus::Pending => "PENDING",
            CustomOrderStatus::Quoted => "QUOTED",
            CustomOrderStatus::Approved => "APPROVED",
            CustomOrderStatus::Paid => "PAID",
            CustomOrderStatus::InProgress => "IN_PROGRESS",
            CustomOrderStatus::Completed => "COMPLETED",
            CustomOrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CustomOrderStatus::Completed | CustomOrderStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: CustomOrderStatus) -> bool {
        use CustomOrderStatus::*;
        match (self, next) {
            (from, Cancelled) => !from.is_terminal(),
            (Pending | Quoted, Quoted) => true,
            (Quoted, Approved) => true,
            (Approved, Paid) => true,
            (Paid, InProgress) => true,
            (InProgress, Completed) => true,
            _ => false,
        }
    }

    /// Payment has been captured (or the work is past that point).
    pub fn is_paid(&self) -> bool {
        matches!(
            self,
            CustomOrderStatus::Paid | CustomOrderStatus::InProgress | CustomOrderStatus::Completed
        )
    }
}

impl fmt::Display for CustomOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub in_stock: bool,
    pub weight_grams: i32,
    pub created_at: DateTime<Utc>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            in_stock: model.stock > 0,
            name: model.name,
            slug: model.slug,
            description: model.description,
            image_url: model.image_url,
            price: model.price,
            stock: model.stock,
            weight_grams: model.weight_grams,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub customer_email: String,
    pub customer_name: String,
    #[schema(value_type = Object)]
    pub shipping_address: serde_json::Value,
    pub subtotal: i64,
    pub tax: i64,
    pub shipping_cost: i64,
    pub discount: i64,
    pub total: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub notes: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            customer_email: model.customer_email,
            customer_name: model.customer_name,
            shipping_address: model.shipping_address,
            subtotal: model.subtotal,
            tax: model.tax,
            shipping_cost: model.shipping_cost,
            discount: model.discount,
            total: model.total,
            status: model.status,
            payment_status: model.payment_status,
            gateway_order_id: model.gateway_order_id,
            notes: model.notes,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_slug: String,
    pub image_url: Option<String>,
    pub unit_price: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            product_slug: model.product_slug,
            image_url: model.image_url,
            unit_price: model.unit_price,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoreSettings {
    pub base_shipping_rate: i64,
    pub per_kg_rate: i64,
    pub free_shipping_threshold: i64,
    pub tax_percent: f64,
    pub currency: String,
}

impl StoreSettings {
    pub const DEFAULT_BASE_SHIPPING_RATE: i64 = 50;
    pub const DEFAULT_PER_KG_RATE: i64 = 40;
    pub const DEFAULT_FREE_SHIPPING_THRESHOLD: i64 = 10_000;
    pub const DEFAULT_TAX_PERCENT: f64 = 12.0;

    pub fn defaults(currency: impl Into<String>) -> Self {
        Self {
            base_shipping_rate: Self::DEFAULT_BASE_SHIPPING_RATE,
            per_kg_rate: Self::DEFAULT_PER_KG_RATE,
            free_shipping_threshold: Self::DEFAULT_FREE_SHIPPING_THRESHOLD,
            tax_percent: Self::DEFAULT_TAX_PERCENT,
            currency: currency.into(),
        }
    }
}

impl From<store_settings::Model> for StoreSettings {
    fn from(model: store_settings::Model) -> Self {
        Self {
            base_shipping_rate: model.base_shipping_rate,
            per_kg_rate: model.per_kg_rate,
            free_shipping_threshold: model.free_shipping_threshold,
            tax_percent: model.tax_percent,
            currency: model.currency,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Workshop {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
}

impl From<workshops::Model> for Workshop {
    fn from(model: workshops::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            description: model.description,
            price: model.price,
            duration_minutes: model.duration_minutes,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkshopSession {
    pub id: Uuid,
    pub workshop_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub spots_total: i32,
    pub spots_booked: i32,
    pub spots_left: i32,
}

impl From<workshop_sessions::Model> for WorkshopSession {
    fn from(model: workshop_sessions::Model) -> Self {
        Self {
            id: model.id,
            workshop_id: model.workshop_id,
            starts_at: model.starts_at.with_timezone(&Utc),
            spots_left: (model.spots_total - model.spots_booked).max(0),
            spots_total: model.spots_total,
            spots_booked: model.spots_booked,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkshopRegistration {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub amount: i64,
    pub payment_status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub rescheduled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<workshop_registrations::Model> for WorkshopRegistration {
    fn from(model: workshop_registrations::Model) -> Self {
        Self {
            id: model.id,
            session_id: model.session_id,
            user_id: model.user_id,
            name: model.name,
            email: model.email,
            amount: model.amount,
            payment_status: model.payment_status,
            gateway_order_id: model.gateway_order_id,
            rescheduled: model.rescheduled,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomOrder {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub description: String,
    pub reference_images: Vec<String>,
    pub budget: Option<i64>,
    pub quoted_price: Option<i64>,
    pub admin_note: Option<String>,
    pub status: CustomOrderStatus,
    pub payment_status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<custom_orders::Model> for CustomOrder {
    fn from(model: custom_orders::Model) -> Self {
        let reference_images = serde_json::from_value(model.reference_images).unwrap_or_default();
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            email: model.email,
            description: model.description,
            reference_images,
            budget: model.budget,
            quoted_price: model.quoted_price,
            admin_note: model.admin_note,
            status: model.status,
            payment_status: model.payment_status,
            gateway_order_id: model.gateway_order_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

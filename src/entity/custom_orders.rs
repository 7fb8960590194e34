use sea_orm::entity::prelude::*;

use crate::models::{CustomOrderStatus, PaymentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "custom_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub description: String,
    pub reference_images: Json,
    pub budget: Option<i64>,
    pub quoted_price: Option<i64>,
    pub admin_note: Option<String>,
    pub status: CustomOrderStatus,
    pub payment_status: PaymentStatus,
    #[sea_orm(unique)]
    pub gateway_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

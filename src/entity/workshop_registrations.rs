use sea_orm::entity::prelude::*;

use crate::models::PaymentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workshop_registrations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub amount: i64,
    pub payment_status: PaymentStatus,
    #[sea_orm(unique)]
    pub gateway_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub rescheduled: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workshop_sessions::Entity",
        from = "Column::SessionId",
        to = "super::workshop_sessions::Column::Id"
    )]
    WorkshopSessions,
}

impl Related<super::workshop_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkshopSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

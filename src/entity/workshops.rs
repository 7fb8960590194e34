use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workshops")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    pub duration_minutes: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::workshop_sessions::Entity")]
    WorkshopSessions,
}

impl Related<super::workshop_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkshopSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workshop_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workshop_id: Uuid,
    pub starts_at: DateTimeWithTimeZone,
    pub spots_total: i32,
    pub spots_booked: i32,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn has_capacity(&self) -> bool {
        self.spots_booked < self.spots_total
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workshops::Entity",
        from = "Column::WorkshopId",
        to = "super::workshops::Column::Id"
    )]
    Workshops,
    #[sea_orm(has_many = "super::workshop_registrations::Entity")]
    WorkshopRegistrations,
}

impl Related<super::workshops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workshops.def()
    }
}

impl Related<super::workshop_registrations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkshopRegistrations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

/// Store-wide pricing knobs. Only the row with `id = 1` is ever used.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "store_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub base_shipping_rate: i64,
    pub per_kg_rate: i64,
    pub free_shipping_threshold: i64,
    #[sea_orm(column_type = "Double")]
    pub tax_percent: f64,
    pub currency: String,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

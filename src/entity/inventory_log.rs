use sea_orm::entity::prelude::*;

// Append-only. No update or delete path exists anywhere in the crate, and
// product_id carries no relation so entries survive product deletion.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub change: i32,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub note: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

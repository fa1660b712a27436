use sea_orm::entity::prelude::*;

/// Daily download count for one OS partition. `count` is NULL while the
/// value has not been observed or derived yet.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "day_counts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub os_type: String,
    pub day_index: i64,
    pub count: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

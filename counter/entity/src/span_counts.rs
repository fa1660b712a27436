use sea_orm::entity::prelude::*;

/// Cumulative download count over the trailing `span_days` window, per OS
/// partition and day. Absence of a row means the total is unknown.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "span_counts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub os_type: String,
    pub day_index: i64,
    pub span_days: i32,
    pub total: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

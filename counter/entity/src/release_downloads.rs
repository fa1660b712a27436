use sea_orm::entity::prelude::*;

/// Raw per-release-asset snapshot pulled from the package registry.
/// `total` is the all-time cumulative counter reported upstream; `today`
/// is the delta against the previous day's row, when that row exists.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "release_downloads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub os_type: String,
    pub arch: String,
    pub version: String,
    pub count_date: Date,
    pub total: i64,
    pub today: Option<i64>,
    pub published_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

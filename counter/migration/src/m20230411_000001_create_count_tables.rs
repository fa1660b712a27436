use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DayCounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DayCounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DayCounts::OsType).string().not_null())
                    .col(ColumnDef::new(DayCounts::DayIndex).big_integer().not_null())
                    .col(ColumnDef::new(DayCounts::Count).big_integer())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("day_counts_os_type_day_index_key")
                    .table(DayCounts::Table)
                    .col(DayCounts::OsType)
                    .col(DayCounts::DayIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SpanCounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpanCounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SpanCounts::OsType).string().not_null())
                    .col(
                        ColumnDef::new(SpanCounts::DayIndex)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SpanCounts::SpanDays).integer().not_null())
                    .col(ColumnDef::new(SpanCounts::Total).big_integer().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("span_counts_os_type_day_index_span_days_key")
                    .table(SpanCounts::Table)
                    .col(SpanCounts::OsType)
                    .col(SpanCounts::DayIndex)
                    .col(SpanCounts::SpanDays)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReleaseDownloads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReleaseDownloads::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReleaseDownloads::OsType).string().not_null())
                    .col(ColumnDef::new(ReleaseDownloads::Arch).string().not_null())
                    .col(
                        ColumnDef::new(ReleaseDownloads::Version)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReleaseDownloads::CountDate).date().not_null())
                    .col(ColumnDef::new(ReleaseDownloads::Total).big_integer().not_null())
                    .col(ColumnDef::new(ReleaseDownloads::Today).big_integer())
                    .col(
                        ColumnDef::new(ReleaseDownloads::PublishedAt)
                            .timestamp_with_time_zone(),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("release_downloads_asset_count_date_key")
                    .table(ReleaseDownloads::Table)
                    .col(ReleaseDownloads::OsType)
                    .col(ReleaseDownloads::Arch)
                    .col(ReleaseDownloads::Version)
                    .col(ReleaseDownloads::CountDate)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReleaseDownloads::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SpanCounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DayCounts::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum DayCounts {
    Table,
    Id,
    OsType,
    DayIndex,
    Count,
}

#[derive(Iden)]
enum SpanCounts {
    Table,
    Id,
    OsType,
    DayIndex,
    SpanDays,
    Total,
}

#[derive(Iden)]
enum ReleaseDownloads {
    Table,
    Id,
    OsType,
    Arch,
    Version,
    CountDate,
    Total,
    Today,
    PublishedAt,
}

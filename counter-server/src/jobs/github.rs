use chrono::{Duration, NaiveDate};
use downloads_counter::data_source::{AssetDownloads, DataSource, GithubSource};
use entity::release_downloads;
use sea_orm::{prelude::*, sea_query, DatabaseConnection, Set};

/// Pulls cumulative per-asset download counters from the releases API and
/// stores one row per `(os, arch, version)` and day. The daily figure is an
/// exact delta against the previous day's row, so no reconstruction run is
/// needed for this source.
pub struct GithubJob {
    source: GithubSource,
    db: DatabaseConnection,
}

impl GithubJob {
    pub fn new(source: GithubSource, db: DatabaseConnection) -> Self {
        Self { source, db }
    }

    pub async fn run(&self, date: NaiveDate) -> anyhow::Result<()> {
        tracing::info!(%date, "fetching github release assets");
        let assets = self.source.fetch().await?;
        tracing::info!(assets = assets.len(), "parsed release assets");

        for asset in assets {
            self.upsert_asset(date, asset).await?;
        }
        Ok(())
    }

    async fn upsert_asset(&self, date: NaiveDate, asset: AssetDownloads) -> anyhow::Result<()> {
        let yesterday = self.find_row(date - Duration::days(1), &asset).await?;
        let today = yesterday.map(|row| asset.total - row.total);

        release_downloads::Entity::insert(release_downloads::ActiveModel {
            id: Default::default(),
            os_type: Set(asset.os_type.as_str().to_string()),
            arch: Set(asset.arch.clone()),
            version: Set(asset.version.clone()),
            count_date: Set(date),
            total: Set(asset.total),
            today: Set(today),
            published_at: Set(asset.published_at),
        })
        .on_conflict(
            sea_query::OnConflict::columns([
                release_downloads::Column::OsType,
                release_downloads::Column::Arch,
                release_downloads::Column::Version,
                release_downloads::Column::CountDate,
            ])
            .update_column(release_downloads::Column::Total)
            .update_column(release_downloads::Column::Today)
            .to_owned(),
        )
        .exec(&self.db)
        .await?;
        Ok(())
    }

    async fn find_row(
        &self,
        date: NaiveDate,
        asset: &AssetDownloads,
    ) -> Result<Option<release_downloads::Model>, DbErr> {
        release_downloads::Entity::find()
            .filter(release_downloads::Column::OsType.eq(asset.os_type.as_str()))
            .filter(release_downloads::Column::Arch.eq(asset.arch.as_str()))
            .filter(release_downloads::Column::Version.eq(asset.version.as_str()))
            .filter(release_downloads::Column::CountDate.eq(date))
            .one(&self.db)
            .await
    }
}

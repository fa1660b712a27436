mod jobs;
mod settings;

pub use jobs::{GithubJob, HomebrewJob};
pub use settings::Settings;

use chrono::Utc;
use downloads_counter::{
    data_source::{GithubSource, HomebrewSource},
    DateIndexer, DbStore, Span,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// One scheduling cycle: run every enabled ingestion job once, concurrently,
/// then exit. Recurrence is the deployment's business (cron or similar),
/// not ours.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    if settings.spans.iter().any(|&days| days == 0) {
        anyhow::bail!("spans must be positive day counts");
    }
    let spans: Vec<Span> = settings.spans.iter().map(|&days| Span::new(days)).collect();
    let indexer = DateIndexer::new(settings.epoch);
    let today = Utc::now().date_naive();

    let db = Database::connect(&settings.db_url).await?;
    if settings.run_migrations {
        Migrator::up(&db, None).await?;
    }
    let store = DbStore::new(db.clone());

    let cancellation = CancellationToken::new();
    tokio::spawn({
        let cancellation = cancellation.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested, cancelling running jobs");
                cancellation.cancel();
            }
        }
    });

    let mut set: JoinSet<(&'static str, anyhow::Result<()>)> = JoinSet::new();
    if settings.homebrew.enabled {
        let job = HomebrewJob::new(
            HomebrewSource::new(
                settings.homebrew.base_url.clone(),
                settings.homebrew.formula.clone(),
            ),
            store.clone(),
            spans.clone(),
            indexer,
        );
        let cancellation = cancellation.clone();
        set.spawn(async move { ("homebrew", job.run(today, cancellation).await) });
    }
    if settings.github.enabled {
        let job = GithubJob::new(
            GithubSource::new(
                settings.github.base_url.clone(),
                settings.github.owner.clone(),
                settings.github.repo.clone(),
            ),
            db.clone(),
        );
        set.spawn(async move { ("github", job.run(today).await) });
    }

    let mut failed = false;
    while let Some(joined) = set.join_next().await {
        let (job, outcome) = joined?;
        match outcome {
            Ok(()) => tracing::info!(job, "job finished"),
            Err(err) => {
                failed = true;
                tracing::error!(job, error = %err, "job failed");
            }
        }
    }
    if failed {
        anyhow::bail!("at least one job failed");
    }
    Ok(())
}

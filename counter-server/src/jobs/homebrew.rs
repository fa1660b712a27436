use chrono::NaiveDate;
use downloads_counter::{
    data_source::{DataSource, HomebrewSource, SpanSnapshot},
    Calculator, DateIndexer, OsType, Span, Store,
};
use tokio_util::sync::CancellationToken;

/// The OS partitions the formula API reports on.
const PARTITIONS: [OsType; 2] = [OsType::Darwin, OsType::Linux];

/// Pulls the rolling install totals from the formula API, seeds them into
/// the store and runs the reconstruction engine for every OS partition the
/// API reports on.
pub struct HomebrewJob<S> {
    source: HomebrewSource,
    store: S,
    calculator: Calculator<S>,
    indexer: DateIndexer,
}

impl<S: Store + Clone> HomebrewJob<S> {
    pub fn new(
        source: HomebrewSource,
        store: S,
        spans: Vec<Span>,
        indexer: DateIndexer,
    ) -> Self {
        let calculator = Calculator::new(spans, store.clone());
        Self {
            source,
            store,
            calculator,
            indexer,
        }
    }

    pub async fn run(
        &self,
        date: NaiveDate,
        cancellation: CancellationToken,
    ) -> anyhow::Result<()> {
        let index = self.indexer.index_of(date);

        tracing::info!(%date, index, "fetching homebrew analytics");
        let snapshots = match self.source.fetch().await {
            Ok(snapshots) => snapshots,
            Err(err) => {
                // Still worth running reconstruction: facts persisted on
                // previous days may have become solvable since.
                tracing::warn!(error = %err, "homebrew fetch failed, reconstructing from stored data only");
                Vec::new()
            }
        };

        for snapshot in &snapshots {
            self.seed(index, snapshot).await?;
        }

        // every partition, not just the ones observed today
        for os_type in PARTITIONS {
            let partition = os_type.as_str();
            tracing::info!(partition, "running reconstruction");
            self.calculator
                .run(partition, index, cancellation.clone())
                .await?;
        }

        Ok(())
    }

    /// Write today's observed window totals, skipping fields that are
    /// already known — observations never revise stored facts.
    async fn seed(&self, index: i64, snapshot: &SpanSnapshot) -> anyhow::Result<()> {
        let partition = snapshot.os_type.as_str();
        let mut record = self.store.get(partition, index).await?;
        let mut changed = false;
        for &span in self.calculator.spans() {
            let Some(&total) = snapshot.totals.get(&span) else {
                continue;
            };
            if record.span_totals.contains_key(&span) {
                continue;
            }
            record.span_totals.insert(span, total);
            changed = true;
        }
        if changed {
            tracing::info!(partition, index, "seeding observed span totals");
            self.store.set(partition, index, record).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use downloads_counter::{MemoryStore, OsType};
    use pretty_assertions::assert_eq;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    const PAYLOAD: &str = r#"{
        "analytics": {
            "install": {"30d": {"aztfexport": 15}, "90d": {"aztfexport": 15}, "365d": {"aztfexport": 15}}
        },
        "analytics-linux": {
            "install": {"30d": {"aztfexport": 4}, "90d": {"aztfexport": 4}, "365d": {"aztfexport": 4}}
        }
    }"#;

    #[tokio::test]
    async fn first_observation_determines_the_first_day() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/formula/aztfexport.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(PAYLOAD, "application/json"))
            .mount(&server)
            .await;

        let epoch = "2023-04-11".parse::<NaiveDate>().unwrap();
        let store = MemoryStore::new();
        let job = HomebrewJob::new(
            HomebrewSource::new(server.uri().parse().unwrap(), "aztfexport"),
            store.clone(),
            vec![Span::new(30), Span::new(90), Span::new(365)],
            DateIndexer::new(epoch),
        );

        // observation lands on the epoch day: everything before it is the
        // zero baseline, so the whole day count is determined
        job.run(epoch, CancellationToken::new()).await.unwrap();

        let darwin = store.record(OsType::Darwin.as_str(), 0);
        assert_eq!(darwin.span_total(Span::new(30)), Some(15));
        assert_eq!(darwin.day_count, Some(15));
        let linux = store.record(OsType::Linux.as_str(), 0);
        assert_eq!(linux.day_count, Some(4));
    }

    #[tokio::test]
    async fn fetch_failure_still_reconstructs_stored_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        // a total observed on an earlier run, not yet worked back to a
        // day count
        let epoch = "2023-04-11".parse::<NaiveDate>().unwrap();
        let store = MemoryStore::new();
        store
            .set(
                OsType::Darwin.as_str(),
                0,
                downloads_counter::DayRecord {
                    day_count: None,
                    span_totals: [(Span::new(30), 7)].into(),
                },
            )
            .await
            .unwrap();

        let job = HomebrewJob::new(
            HomebrewSource::new(server.uri().parse().unwrap(), "aztfexport"),
            store.clone(),
            vec![Span::new(30)],
            DateIndexer::new(epoch),
        );
        job.run(epoch, CancellationToken::new()).await.unwrap();

        assert_eq!(store.record(OsType::Darwin.as_str(), 0).day_count, Some(7));
    }

    #[tokio::test]
    async fn observations_do_not_revise_known_totals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/formula/aztfexport.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(PAYLOAD, "application/json"))
            .mount(&server)
            .await;

        let epoch = "2023-04-11".parse::<NaiveDate>().unwrap();
        let store = MemoryStore::new();
        store
            .set(
                OsType::Darwin.as_str(),
                0,
                downloads_counter::DayRecord {
                    day_count: None,
                    span_totals: [(Span::new(30), 99)].into(),
                },
            )
            .await
            .unwrap();

        let job = HomebrewJob::new(
            HomebrewSource::new(server.uri().parse().unwrap(), "aztfexport"),
            store.clone(),
            vec![Span::new(30)],
            DateIndexer::new(epoch),
        );
        job.run(epoch, CancellationToken::new()).await.unwrap();

        assert_eq!(
            store.record(OsType::Darwin.as_str(), 0).span_total(Span::new(30)),
            Some(99)
        );
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use entity::{day_counts, span_counts};
use sea_orm::{prelude::*, sea_query, DatabaseConnection, Set};

use super::{Store, StoreError};
use crate::types::{DayIndex, DayRecord, Span};

/// Store backed by the `day_counts` and `span_counts` tables.
#[derive(Debug, Clone)]
pub struct DbStore {
    db: Arc<DatabaseConnection>,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db: Arc::new(db) }
    }
}

#[async_trait]
impl Store for DbStore {
    async fn get(&self, partition: &str, index: DayIndex) -> Result<DayRecord, StoreError> {
        let day_rows = day_counts::Entity::find()
            .filter(day_counts::Column::OsType.eq(partition))
            .filter(day_counts::Column::DayIndex.eq(index))
            .all(self.db.as_ref())
            .await?;
        if day_rows.len() > 1 {
            return Err(StoreError::DuplicateRecord {
                partition: partition.to_string(),
                index,
                count: day_rows.len(),
            });
        }
        let day_count = day_rows.first().and_then(|row| row.count);

        let span_rows = span_counts::Entity::find()
            .filter(span_counts::Column::OsType.eq(partition))
            .filter(span_counts::Column::DayIndex.eq(index))
            .all(self.db.as_ref())
            .await?;
        let mut span_totals = BTreeMap::new();
        for row in &span_rows {
            let days = u32::try_from(row.span_days)
                .ok()
                .filter(|&days| days > 0)
                .ok_or_else(|| {
                    StoreError::Internal(format!(
                        "invalid span_days {} for partition '{partition}' at index {index}",
                        row.span_days
                    ))
                })?;
            let span = Span::new(days);
            if span_totals.insert(span, row.total).is_some() {
                return Err(StoreError::DuplicateRecord {
                    partition: partition.to_string(),
                    index,
                    count: span_rows.len(),
                });
            }
        }

        Ok(DayRecord {
            day_count,
            span_totals,
        })
    }

    async fn set(
        &self,
        partition: &str,
        index: DayIndex,
        record: DayRecord,
    ) -> Result<(), StoreError> {
        // an unknown day count never overwrites whatever is already stored
        if record.day_count.is_some() {
            day_counts::Entity::insert(day_counts::ActiveModel {
                id: Default::default(),
                os_type: Set(partition.to_string()),
                day_index: Set(index),
                count: Set(record.day_count),
            })
            .on_conflict(
                sea_query::OnConflict::columns([
                    day_counts::Column::OsType,
                    day_counts::Column::DayIndex,
                ])
                .update_column(day_counts::Column::Count)
                .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        }

        let mut span_models = record
            .span_totals
            .into_iter()
            .map(|(span, total)| span_counts::ActiveModel {
                id: Default::default(),
                os_type: Set(partition.to_string()),
                day_index: Set(index),
                span_days: Set(span.days() as i32),
                total: Set(total),
            })
            .peekable();
        if span_models.peek().is_some() {
            span_counts::Entity::insert_many(span_models)
                .on_conflict(
                    sea_query::OnConflict::columns([
                        span_counts::Column::OsType,
                        span_counts::Column::DayIndex,
                        span_counts::Column::SpanDays,
                    ])
                    .update_column(span_counts::Column::Total)
                    .to_owned(),
                )
                .exec(self.db.as_ref())
                .await?;
        }

        Ok(())
    }
}

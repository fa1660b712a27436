use std::collections::HashMap;

use crate::{
    store::Store,
    types::{DayIndex, DayRecord, Span},
};

use super::CalcError;

/// Per-run view of one store partition: a memoized read cache plus the
/// write-once guards. Owned by a single [`Calculator::run`](super::Calculator::run)
/// invocation and dropped with it — cached records must never outlive the
/// run they were read in.
pub(super) struct RunContext<'a, S: Store + ?Sized> {
    store: &'a S,
    partition: &'a str,
    spans: &'a [Span],
    cache: HashMap<DayIndex, DayRecord>,
    writes: u64,
}

impl<'a, S: Store + ?Sized> RunContext<'a, S> {
    pub fn new(store: &'a S, partition: &'a str, spans: &'a [Span]) -> Self {
        Self {
            store,
            partition,
            spans,
            cache: HashMap::new(),
            writes: 0,
        }
    }

    pub fn spans(&self) -> &'a [Span] {
        self.spans
    }

    /// Successful field writes performed in this run.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Read one day's record, memoized. Days before the epoch are the
    /// known-zero pre-history baseline and never hit the store.
    pub async fn record(&mut self, index: DayIndex) -> Result<DayRecord, CalcError> {
        if index < 0 {
            return Ok(DayRecord::prehistory(self.spans));
        }
        if let Some(record) = self.cache.get(&index) {
            return Ok(record.clone());
        }
        let record = self.store.get(self.partition, index).await?;
        self.cache.insert(index, record.clone());
        Ok(record)
    }

    /// Persist a newly derived day count. Fatal if the field is already
    /// known with a different value — values are only ever discovered, never
    /// revised.
    pub async fn write_day(&mut self, index: DayIndex, value: i64) -> Result<(), CalcError> {
        let mut record = self.record(index).await?;
        match record.day_count {
            Some(existing) if existing == value => Ok(()),
            Some(existing) => Err(CalcError::InvariantViolation(format!(
                "day count at index {index} already known as {existing}, derived {value}"
            ))),
            None => {
                record.day_count = Some(value);
                self.persist(index, record).await
            }
        }
    }

    /// Persist a newly derived span total, same write-once contract.
    pub async fn write_total(
        &mut self,
        index: DayIndex,
        span: Span,
        value: i64,
    ) -> Result<(), CalcError> {
        let mut record = self.record(index).await?;
        match record.span_total(span) {
            Some(existing) if existing == value => Ok(()),
            Some(existing) => Err(CalcError::InvariantViolation(format!(
                "{span} total at index {index} already known as {existing}, derived {value}"
            ))),
            None => {
                record.span_totals.insert(span, value);
                self.persist(index, record).await
            }
        }
    }

    async fn persist(&mut self, index: DayIndex, record: DayRecord) -> Result<(), CalcError> {
        self.store.set(self.partition, index, record.clone()).await?;
        self.cache.insert(index, record);
        self.writes += 1;
        Ok(())
    }
}

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;

use super::{Store, StoreError};
use crate::types::{DayIndex, DayRecord};

/// In-process store keyed by `(partition, index)`.
///
/// Mainly a test double for the engine, hence the write counter and the
/// fault knobs, but it is a complete implementation of the contract.
/// Cloning yields a handle to the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: Mutex<HashMap<(String, DayIndex), DayRecord>>,
    duplicated: Mutex<HashSet<(String, DayIndex)>>,
    writes: AtomicU64,
    fail_io: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls performed so far.
    pub fn writes(&self) -> u64 {
        self.inner.writes.load(Ordering::Relaxed)
    }

    /// Make every subsequent `get`/`set` fail with a database error.
    pub fn fail_io(&self) {
        self.inner.fail_io.store(true, Ordering::Relaxed);
    }

    /// Pretend the given key holds two conflicting rows, as a corrupted
    /// store would.
    pub fn mark_duplicated(&self, partition: &str, index: DayIndex) {
        self.inner
            .duplicated
            .lock()
            .unwrap()
            .insert((partition.to_string(), index));
    }

    pub fn record(&self, partition: &str, index: DayIndex) -> DayRecord {
        self.inner
            .records
            .lock()
            .unwrap()
            .get(&(partition.to_string(), index))
            .cloned()
            .unwrap_or_default()
    }

    fn check_io(&self) -> Result<(), StoreError> {
        if self.inner.fail_io.load(Ordering::Relaxed) {
            return Err(StoreError::Internal("injected i/o failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, partition: &str, index: DayIndex) -> Result<DayRecord, StoreError> {
        self.check_io()?;
        let key = (partition.to_string(), index);
        if self.inner.duplicated.lock().unwrap().contains(&key) {
            return Err(StoreError::DuplicateRecord {
                partition: partition.to_string(),
                index,
                count: 2,
            });
        }
        Ok(self
            .inner
            .records
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    async fn set(
        &self,
        partition: &str,
        index: DayIndex,
        record: DayRecord,
    ) -> Result<(), StoreError> {
        self.check_io()?;
        let mut records = self.inner.records.lock().unwrap();
        let entry = records
            .entry((partition.to_string(), index))
            .or_default();
        // upsert semantics: merge instead of blind replace
        if record.day_count.is_some() {
            entry.day_count = record.day_count;
        }
        entry.span_totals.extend(record.span_totals);
        self.inner.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

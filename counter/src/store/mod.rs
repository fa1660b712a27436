//! Persistence contract the reconstruction engine runs against.
//!
//! The engine only ever needs two operations, both keyed by
//! `(partition, day index)`. Implementations must return a fully-unknown
//! [`DayRecord`] for days that were never persisted — absence of data is a
//! normal state, not an error.

mod db;
mod memory;

pub use db::DbStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

use crate::types::{DayIndex, DayRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    /// More than one row where the `(partition, index)` key must be unique.
    /// Surfaced separately from I/O failures so that callers alert instead
    /// of retrying.
    #[error("found {count} records for partition '{partition}' at index {index}")]
    DuplicateRecord {
        partition: String,
        index: DayIndex,
        count: usize,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Read the record for one day. Days without persisted data yield
    /// [`DayRecord::unknown`].
    async fn get(&self, partition: &str, index: DayIndex) -> Result<DayRecord, StoreError>;

    /// Upsert the record for one day. Fields absent from `record` must be
    /// left untouched in the underlying storage.
    async fn set(
        &self,
        partition: &str,
        index: DayIndex,
        record: DayRecord,
    ) -> Result<(), StoreError>;
}

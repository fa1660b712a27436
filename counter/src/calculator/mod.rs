//! Sparse time-series reconstruction engine.
//!
//! The store holds partially-observed daily download counts plus rolling
//! cumulative totals over fixed trailing windows ([`Span`]s). Whenever three
//! of the four quantities tied together by the incremental relation (see
//! [`rules`]) are known, the fourth is derived and persisted, and every task
//! that might now be solvable is queued. Draining the queue reaches a
//! fixpoint: either everything derivable has been derived, or the input was
//! under-determined and the remaining fields stay unknown — a valid terminal
//! state, not an error.

mod context;
pub mod queue;
mod rules;

#[cfg(test)]
mod tests;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    store::{Store, StoreError},
    types::{DayIndex, Span},
};

use self::{
    context::RunContext,
    queue::{RuleKind, Task, TaskQueue},
};

#[derive(Error, Debug)]
pub enum CalcError {
    /// Reading or writing the store failed. Fatal for the current run; the
    /// caller decides whether to retry the run as a whole.
    #[error("store error: {0}")]
    Store(StoreError),
    /// The store contradicts itself: either duplicate rows under a unique
    /// key, or a derived value conflicting with an already-known one.
    /// Callers should alert, not retry.
    #[error("store invariant violated: {0}")]
    InvariantViolation(String),
    /// Cooperative abort requested through the run's cancellation token.
    #[error("calculation cancelled")]
    Cancelled,
}

impl From<StoreError> for CalcError {
    fn from(err: StoreError) -> Self {
        match err {
            dup @ StoreError::DuplicateRecord { .. } => {
                CalcError::InvariantViolation(dup.to_string())
            }
            other => CalcError::Store(other),
        }
    }
}

/// Drives reconstruction runs against one [`Store`].
///
/// A run is single-threaded and owns a private read cache, so within a run
/// every rule observes a consistent snapshot. Runs on different partitions
/// share no mutable state and may execute concurrently.
pub struct Calculator<S> {
    spans: Vec<Span>,
    store: S,
}

impl<S: Store> Calculator<S> {
    pub fn new(spans: impl IntoIterator<Item = Span>, store: S) -> Self {
        let mut spans: Vec<Span> = spans.into_iter().collect();
        spans.sort_unstable();
        spans.dedup();
        Self { spans, store }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Run propagation to a fixpoint, starting from `seed_index`.
    ///
    /// All four rule kinds are seeded at `seed_index` for every span; any
    /// further work comes from successor tasks of successful derivations.
    /// The first fatal error aborts the drain; the cancellation token is
    /// checked once per dequeued task.
    #[instrument(skip(self, cancellation), fields(partition = partition, seed = seed_index))]
    pub async fn run(
        &self,
        partition: &str,
        seed_index: DayIndex,
        cancellation: CancellationToken,
    ) -> Result<(), CalcError> {
        let mut cx = RunContext::new(&self.store, partition, &self.spans);
        let mut queue = TaskQueue::default();
        for &span in &self.spans {
            queue.enqueue(
                RuleKind::ALL
                    .into_iter()
                    .map(|kind| Task::new(kind, seed_index, span)),
            );
        }

        let mut dispatched: u64 = 0;
        while let Some(task) = queue.dequeue() {
            if cancellation.is_cancelled() {
                tracing::debug!(dispatched, pending = queue.len(), "drain cancelled");
                return Err(CalcError::Cancelled);
            }
            let successors = rules::apply(&mut cx, task).await?;
            queue.enqueue(successors);
            dispatched += 1;
        }

        tracing::debug!(dispatched, derived = cx.writes(), "reached fixpoint");
        Ok(())
    }
}

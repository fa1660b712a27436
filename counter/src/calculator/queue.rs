use std::collections::VecDeque;

use crate::types::{DayIndex, Span};

/// The four ways the incremental relation
/// `total(n, s) = day(n) + total(n-1, s) - day(n-s)`
/// can be solved, one per unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Solve for `day(n)`.
    ForwardDay,
    /// Solve for `total(n, s)`.
    ForwardTotal,
    /// Solve for `day(n-s)`.
    BackwardDay,
    /// Solve for `total(n-1, s)`.
    BackwardTotal,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::ForwardDay,
        RuleKind::ForwardTotal,
        RuleKind::BackwardDay,
        RuleKind::BackwardTotal,
    ];
}

/// One pending inference step. A plain value so that pending work stays
/// inspectable; dispatch happens in the rules module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub kind: RuleKind,
    pub index: DayIndex,
    pub span: Span,
}

impl Task {
    pub fn new(kind: RuleKind, index: DayIndex, span: Span) -> Self {
        Self { kind, index, span }
    }
}

/// FIFO of pending tasks, driving a breadth-first propagation wavefront.
///
/// Deliberately no deduplication: a task whose target is already known is a
/// cheap no-op, and the number of successful derivations is bounded by the
/// number of unknown fields, so the drain always terminates.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
}

impl TaskQueue {
    pub fn enqueue(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.tasks.extend(tasks);
    }

    pub fn dequeue(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn queue_is_fifo() {
        let span = Span::new(30);
        let mut queue = TaskQueue::default();
        assert!(queue.is_empty());
        queue.enqueue([
            Task::new(RuleKind::ForwardDay, 1, span),
            Task::new(RuleKind::ForwardTotal, 2, span),
        ]);
        queue.enqueue([Task::new(RuleKind::BackwardDay, 3, span)]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dequeue(), Some(Task::new(RuleKind::ForwardDay, 1, span)));
        assert_eq!(
            queue.dequeue(),
            Some(Task::new(RuleKind::ForwardTotal, 2, span))
        );
        assert_eq!(queue.dequeue(), Some(Task::new(RuleKind::BackwardDay, 3, span)));
        assert_eq!(queue.dequeue(), None);
        assert!(queue.is_empty());
    }
}

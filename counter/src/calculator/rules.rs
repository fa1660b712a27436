//! The four propagation rule families.
//!
//! Everything is local algebra over the incremental relation
//!
//! ```text
//! total(n, s) = day(n) + total(n-1, s) - day(n-s)
//! ```
//!
//! Each rule solves the relation for exactly one unknown, given the other
//! three. A rule application is a no-op (not an error) when its target is
//! already known or when a dependency is still unknown; on success it writes
//! the single derived field and returns every task whose preconditions now
//! might hold.

use crate::{
    store::Store,
    types::{DayIndex, Span},
};

use super::{
    context::RunContext,
    queue::{RuleKind, Task},
    CalcError,
};

pub(super) async fn apply<S: Store + ?Sized>(
    cx: &mut RunContext<'_, S>,
    task: Task,
) -> Result<Vec<Task>, CalcError> {
    let Task { kind, index, span } = task;
    match kind {
        RuleKind::ForwardDay => forward_day(cx, index, span).await,
        RuleKind::ForwardTotal => forward_total(cx, index, span).await,
        RuleKind::BackwardDay => backward_day(cx, index, span).await,
        RuleKind::BackwardTotal => backward_total(cx, index, span).await,
    }
}

/// `day(n) = total(n, s) - total(n-1, s) + day(n-s)`
async fn forward_day<S: Store + ?Sized>(
    cx: &mut RunContext<'_, S>,
    n: DayIndex,
    span: Span,
) -> Result<Vec<Task>, CalcError> {
    let this = cx.record(n).await?;
    if this.day_count.is_some() {
        return Ok(vec![]);
    }
    let prev = cx.record(n - 1).await?;
    let window_start = cx.record(n - span.days()).await?;

    let (Some(total), Some(prev_total), Some(start_day)) = (
        this.span_total(span),
        prev.span_total(span),
        window_start.day_count,
    ) else {
        return Ok(vec![]);
    };

    let value = total - prev_total + start_day;
    tracing::debug!(index = n, %span, value, "derived day count");
    cx.write_day(n, value).await?;
    Ok(day_written(cx.spans(), n))
}

/// `total(n, s) = day(n) + total(n-1, s) - day(n-s)`
async fn forward_total<S: Store + ?Sized>(
    cx: &mut RunContext<'_, S>,
    n: DayIndex,
    span: Span,
) -> Result<Vec<Task>, CalcError> {
    let this = cx.record(n).await?;
    if this.span_total(span).is_some() {
        return Ok(vec![]);
    }
    let prev = cx.record(n - 1).await?;
    let window_start = cx.record(n - span.days()).await?;

    let (Some(day), Some(prev_total), Some(start_day)) =
        (this.day_count, prev.span_total(span), window_start.day_count)
    else {
        return Ok(vec![]);
    };

    let value = day + prev_total - start_day;
    tracing::debug!(index = n, %span, value, "derived span total");
    cx.write_total(n, span, value).await?;
    Ok(total_written(n, span))
}

/// `day(n-s) = total(n, s) - total(n-1, s) + day(n)`, written to index `n-s`
async fn backward_day<S: Store + ?Sized>(
    cx: &mut RunContext<'_, S>,
    n: DayIndex,
    span: Span,
) -> Result<Vec<Task>, CalcError> {
    let target_index = n - span.days();
    let target = cx.record(target_index).await?;
    if target.day_count.is_some() {
        return Ok(vec![]);
    }
    let this = cx.record(n).await?;
    let prev = cx.record(n - 1).await?;

    let (Some(total), Some(prev_total), Some(day)) =
        (this.span_total(span), prev.span_total(span), this.day_count)
    else {
        return Ok(vec![]);
    };

    let value = total - prev_total + day;
    tracing::debug!(index = target_index, %span, value, "derived day count");
    cx.write_day(target_index, value).await?;
    Ok(day_written(cx.spans(), target_index))
}

/// `total(n-1, s) = total(n, s) - day(n) + day(n-s)`, written to index `n-1`
async fn backward_total<S: Store + ?Sized>(
    cx: &mut RunContext<'_, S>,
    n: DayIndex,
    span: Span,
) -> Result<Vec<Task>, CalcError> {
    let target_index = n - 1;
    let target = cx.record(target_index).await?;
    if target.span_total(span).is_some() {
        return Ok(vec![]);
    }
    let this = cx.record(n).await?;
    let window_start = cx.record(n - span.days()).await?;

    let (Some(total), Some(day), Some(start_day)) =
        (this.span_total(span), this.day_count, window_start.day_count)
    else {
        return Ok(vec![]);
    };

    let value = total - day + start_day;
    tracing::debug!(index = target_index, %span, value, "derived span total");
    cx.write_total(target_index, span, value).await?;
    Ok(total_written(target_index, span))
}

/// Tasks whose precondition set includes a day count that just became known
/// at `index`. Day counts feed rules of every span, both as the day inside
/// the window (`day(n)`) and as the day falling out of it (`day(n-s)`).
fn day_written(spans: &[Span], index: DayIndex) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(spans.len() * 6);
    for &span in spans {
        let offset = index + span.days();
        tasks.extend([
            Task::new(RuleKind::ForwardTotal, index, span),
            Task::new(RuleKind::BackwardDay, index, span),
            Task::new(RuleKind::BackwardTotal, index, span),
            Task::new(RuleKind::ForwardDay, offset, span),
            Task::new(RuleKind::ForwardTotal, offset, span),
            Task::new(RuleKind::BackwardTotal, offset, span),
        ]);
    }
    tasks
}

/// Tasks whose precondition set includes a span total that just became known
/// at `index`. Totals only ever appear in preconditions of their own span,
/// at the index itself and one step forward.
fn total_written(index: DayIndex, span: Span) -> Vec<Task> {
    vec![
        Task::new(RuleKind::ForwardDay, index, span),
        Task::new(RuleKind::BackwardDay, index, span),
        Task::new(RuleKind::BackwardTotal, index, span),
        Task::new(RuleKind::ForwardDay, index + 1, span),
        Task::new(RuleKind::ForwardTotal, index + 1, span),
        Task::new(RuleKind::BackwardDay, index + 1, span),
    ]
}

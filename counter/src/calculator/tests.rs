use pretty_assertions::assert_eq;
use rstest::rstest;
use tokio_util::sync::CancellationToken;

use super::{CalcError, Calculator};
use crate::{
    store::{MemoryStore, Store},
    types::{DayIndex, DayRecord, Span},
};

const OS: &str = "darwin";

fn s(days: u32) -> Span {
    Span::new(days)
}

async fn seed_day(store: &MemoryStore, index: DayIndex, value: i64) {
    store
        .set(
            OS,
            index,
            DayRecord {
                day_count: Some(value),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

async fn seed_total(store: &MemoryStore, index: DayIndex, span: Span, value: i64) {
    store
        .set(
            OS,
            index,
            DayRecord {
                day_count: None,
                span_totals: [(span, value)].into(),
            },
        )
        .await
        .unwrap();
}

/// One calculator invocation per day, the way the scheduled job drives it.
async fn run_daily(calculator: &Calculator<MemoryStore>, up_to: DayIndex) {
    for seed in 0..=up_to {
        calculator
            .run(OS, seed, CancellationToken::new())
            .await
            .unwrap();
    }
}

fn rolling_sum(days: &[i64], n: usize, span: Span) -> i64 {
    let start = (n as i64 - span.days() + 1).max(0) as usize;
    days[start..=n].iter().sum()
}

#[tokio::test]
async fn thirty_day_scenario_reconstructs_totals() {
    // day(0) = 0, total(0, 30) = 0, day(1..=30) = 1..=30
    let store = MemoryStore::new();
    seed_day(&store, 0, 0).await;
    seed_total(&store, 0, s(30), 0).await;
    for day in 1..=30 {
        seed_day(&store, day, day).await;
    }

    let calculator = Calculator::new([s(30)], store.clone());
    run_daily(&calculator, 30).await;

    assert_eq!(store.record(OS, 30).span_total(s(30)), Some(465));
    assert_eq!(store.record(OS, 29).span_total(s(30)), Some(435));
}

#[tokio::test]
async fn forward_totals_cascade_within_a_single_run() {
    // A single run seeded at the earliest solvable index carries the whole
    // forward chain: each derived total re-enqueues the next index.
    let store = MemoryStore::new();
    seed_day(&store, 0, 0).await;
    seed_total(&store, 0, s(30), 0).await;
    for day in 1..=30 {
        seed_day(&store, day, day).await;
    }

    let calculator = Calculator::new([s(30)], store.clone());
    calculator
        .run(OS, 1, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(store.record(OS, 30).span_total(s(30)), Some(465));
    assert_eq!(store.record(OS, 29).span_total(s(30)), Some(435));
}

#[rstest]
#[case(vec![s(7)])]
#[case(vec![s(7), s(10)])]
#[case(vec![s(3), s(7), s(30)])]
#[tokio::test]
async fn exact_determinacy_for_ground_truth_days(#[case] spans: Vec<Span>) {
    let days: Vec<i64> = (0..40).map(|n| (n * 13 + 5) % 17).collect();
    let last = days.len() as DayIndex - 1;

    let store = MemoryStore::new();
    for (index, &value) in days.iter().enumerate() {
        seed_day(&store, index as DayIndex, value).await;
    }
    for &span in &spans {
        seed_total(&store, 0, span, days[0]).await;
    }

    let calculator = Calculator::new(spans.clone(), store.clone());
    run_daily(&calculator, last).await;

    for n in 0..days.len() {
        for &span in &spans {
            assert_eq!(
                store.record(OS, n as DayIndex).span_total(span),
                Some(rolling_sum(&days, n, span)),
                "wrong {span} total at index {n}",
            );
        }
    }
}

#[tokio::test]
async fn day_counts_recovered_from_daily_totals() {
    // The production shape: the upstream API reports rolling totals every
    // day, daily counts are never observed directly.
    let days: Vec<i64> = (0..20).map(|n| (n * 7 + 3) % 11).collect();
    let span = s(7);

    let store = MemoryStore::new();
    for n in 0..days.len() {
        seed_total(&store, n as DayIndex, span, rolling_sum(&days, n, span)).await;
    }

    let calculator = Calculator::new([span], store.clone());
    run_daily(&calculator, days.len() as DayIndex - 1).await;

    for (index, &value) in days.iter().enumerate() {
        assert_eq!(
            store.record(OS, index as DayIndex).day_count,
            Some(value),
            "wrong day count at index {index}",
        );
    }
}

#[tokio::test]
async fn prehistory_seeds_the_first_day() {
    // total(0, s) alone determines day(0) because every earlier day is the
    // known-zero baseline.
    let store = MemoryStore::new();
    seed_total(&store, 0, s(30), 7).await;

    let calculator = Calculator::new([s(30)], store.clone());
    calculator
        .run(OS, 0, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(store.record(OS, 0).day_count, Some(7));
}

#[tokio::test]
async fn second_run_at_fixpoint_writes_nothing() {
    let store = MemoryStore::new();
    seed_day(&store, 0, 0).await;
    seed_total(&store, 0, s(7), 0).await;
    for day in 1..=10 {
        seed_day(&store, day, day).await;
    }

    let calculator = Calculator::new([s(7)], store.clone());
    run_daily(&calculator, 10).await;
    let writes_at_fixpoint = store.writes();

    run_daily(&calculator, 10).await;
    assert_eq!(store.writes(), writes_at_fixpoint);
}

#[tokio::test]
async fn under_determined_input_terminates_with_unknowns() {
    // A lone total far from any known day: nothing is derivable, the queue
    // must still drain.
    let store = MemoryStore::new();
    seed_total(&store, 10, s(30), 100).await;

    let calculator = Calculator::new([s(30)], store.clone());
    calculator
        .run(OS, 10, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(store.record(OS, 10).day_count, None);
    assert_eq!(store.record(OS, 9).span_total(s(30)), None);
}

#[rstest]
#[case(vec![s(7), s(10)], vec![s(10), s(7)])]
#[tokio::test]
async fn final_state_does_not_depend_on_span_order(
    #[case] first: Vec<Span>,
    #[case] second: Vec<Span>,
) {
    let days: Vec<i64> = (0..25).map(|n| (n * 5 + 1) % 9).collect();
    let last = days.len() as DayIndex - 1;

    let mut snapshots = Vec::new();
    for spans in [first, second] {
        let store = MemoryStore::new();
        for (index, &value) in days.iter().enumerate() {
            seed_day(&store, index as DayIndex, value).await;
        }
        for &span in &spans {
            seed_total(&store, 0, span, days[0]).await;
        }

        let calculator = Calculator::new(spans, store.clone());
        run_daily(&calculator, last).await;

        let snapshot: Vec<DayRecord> = (0..=last).map(|index| store.record(OS, index)).collect();
        snapshots.push(snapshot);
    }

    assert_eq!(snapshots[0], snapshots[1]);
}

#[rstest]
#[case(7)]
#[case(11)]
#[case(23)]
#[tokio::test]
async fn final_state_does_not_depend_on_run_order(#[case] stride: i64) {
    // Visiting the seed indices in a scrambled order permutes every task
    // and successor ordering downstream; the fixpoint must not move.
    let days: Vec<i64> = (0..25).map(|n| (n * 5 + 1) % 9).collect();
    let len = days.len() as DayIndex;
    let spans = vec![s(7), s(10)];

    let mut snapshots = Vec::new();
    for pass in 0..2 {
        let store = MemoryStore::new();
        for (index, &value) in days.iter().enumerate() {
            seed_day(&store, index as DayIndex, value).await;
        }
        for &span in &spans {
            seed_total(&store, 0, span, days[0]).await;
        }

        let calculator = Calculator::new(spans.clone(), store.clone());
        match pass {
            // baseline: chronological daily runs
            0 => run_daily(&calculator, len - 1).await,
            // stride walk: hits every index exactly once, out of order
            _ => {
                for step in 0..len {
                    let seed = (step * stride) % len;
                    calculator
                        .run(OS, seed, CancellationToken::new())
                        .await
                        .unwrap();
                }
            }
        }

        let snapshot: Vec<DayRecord> = (0..len).map(|index| store.record(OS, index)).collect();
        snapshots.push(snapshot);
    }

    assert_eq!(snapshots[0], snapshots[1]);
}

#[tokio::test]
async fn duplicate_rows_abort_with_invariant_violation() {
    let store = MemoryStore::new();
    seed_total(&store, 0, s(30), 7).await;
    let writes_before_run = store.writes();
    store.mark_duplicated(OS, 0);

    let calculator = Calculator::new([s(30)], store.clone());
    let err = calculator
        .run(OS, 0, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CalcError::InvariantViolation(_)), "{err}");
    assert_eq!(store.writes(), writes_before_run);
}

#[tokio::test]
async fn store_failure_aborts_the_run() {
    let store = MemoryStore::new();
    seed_total(&store, 0, s(30), 7).await;
    store.fail_io();

    let calculator = Calculator::new([s(30)], store.clone());
    let err = calculator
        .run(OS, 0, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CalcError::Store(_)), "{err}");
}

#[tokio::test]
async fn cancellation_stops_before_any_write() {
    let store = MemoryStore::new();
    seed_total(&store, 0, s(30), 7).await;
    let writes_before_run = store.writes();

    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let calculator = Calculator::new([s(30)], store.clone());
    let err = calculator
        .run(OS, 0, cancellation)
        .await
        .unwrap_err();

    assert!(matches!(err, CalcError::Cancelled), "{err}");
    assert_eq!(store.writes(), writes_before_run);
}

#[tokio::test]
async fn partitions_are_independent() {
    let store = MemoryStore::new();
    seed_total(&store, 0, s(30), 7).await;
    store
        .set(
            "linux",
            0,
            DayRecord {
                day_count: None,
                span_totals: [(s(30), 3)].into(),
            },
        )
        .await
        .unwrap();

    let calculator = Calculator::new([s(30)], store.clone());
    calculator
        .run(OS, 0, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(store.record(OS, 0).day_count, Some(7));
    // untouched: the run owned the darwin partition only
    assert_eq!(store.record("linux", 0).day_count, None);
}

use std::sync::Arc;

use metaforge_core::{Evaluation, Evaluator, Movement, Solution, ThreadManager};
use metaforge_test::{
    sum_evaluator, FailingNeighborhood, LogEntry, ScriptedNeighborhood, ShiftMove,
    ShiftNeighborhood, VectorSolution,
};
use proptest::prelude::*;

use super::*;
use crate::stop::StopTimeIteration;
use crate::telemetry::{CountingSink, TelemetryKind};

fn threads() -> ThreadManager {
    ThreadManager::single(Some(3))
}

#[test]
fn test_next_move_before_build_is_exhausted() {
    let threads = threads();
    let random = threads.random(0);
    let mut tracked = TrackedNeighborhood::new(ScriptedNeighborhood::new(0, vec![1]));

    assert!(tracked.next_move(&random).unwrap_err().is_exhausted());
}

#[test]
fn test_next_move_after_end_is_exhausted_until_rebuilt() {
    let threads = threads();
    let random = threads.random(0);
    let solution = VectorSolution::zeros(1);
    let mut tracked = TrackedNeighborhood::new(ScriptedNeighborhood::new(0, vec![1]));

    assert!(tracked.build(&random, &solution).unwrap());
    assert!(tracked.next_move(&random).unwrap().is_some());
    assert!(tracked.next_move(&random).unwrap().is_none());
    assert!(tracked.next_move(&random).unwrap_err().is_exhausted());

    assert!(tracked.build(&random, &solution).unwrap());
    assert!(tracked.next_move(&random).unwrap().is_some());
}

#[test]
fn test_outstanding_move_blocks_next_move() {
    let threads = threads();
    let random = threads.random(0);
    let mut solution = VectorSolution::zeros(1);
    let mut tracked = TrackedNeighborhood::new(ScriptedNeighborhood::new(0, vec![1, 2]));

    tracked.build(&random, &solution).unwrap();
    let pending = tracked.next_move(&random).unwrap().unwrap();
    let applied = tracked.apply(pending, &mut solution).unwrap().unwrap();
    assert!(tracked.has_outstanding_move());
    assert!(tracked.next_move(&random).is_err());

    tracked.accept(applied, 1.0);
    assert!(!tracked.has_outstanding_move());
    assert!(tracked.next_move(&random).unwrap().is_some());
}

#[test]
fn test_apply_unapply_updates_report() {
    let threads = threads();
    let random = threads.random(0);
    let mut solution = VectorSolution::zeros(1);
    let sink = Arc::new(CountingSink::new());
    let mut tracked = TrackedNeighborhood::new(ScriptedNeighborhood::new(0, vec![4]))
        .with_sink(sink.clone());

    tracked.build(&random, &solution).unwrap();
    let pending = tracked.next_move(&random).unwrap().unwrap();
    assert_eq!(pending.cost(), 4.0);
    let applied = tracked.apply(pending, &mut solution).unwrap().unwrap();
    assert_eq!(solution.values, vec![4]);

    let discarded = sum_evaluator().evaluate(&solution);
    tracked.unapply(applied, &mut solution, &discarded).unwrap();
    assert_eq!(solution.values, vec![0]);

    let report = tracked.report();
    assert_eq!(report.searches, 1);
    assert_eq!(report.moves_yielded, 1);
    assert_eq!(report.applies, 1);
    assert_eq!(report.unapplies, 1);
    assert_eq!(report.unapply_no_constraint, 1);
    assert_eq!(sink.count(TelemetryKind::SearchStart), 1);
    assert_eq!(sink.count(TelemetryKind::ApplyEnd), 1);
    assert_eq!(sink.count(TelemetryKind::UnapplyEnd), 1);
}

#[test]
fn test_inapplicable_move_is_dropped() {
    let threads = threads();
    let random = threads.random(0);
    let mut solution = VectorSolution::zeros(1);
    // index 3 does not exist in a one-element solution
    let mut tracked = TrackedNeighborhood::new(ScriptedNeighborhood::new(3, vec![1]));

    tracked.build(&random, &solution).unwrap();
    let pending = tracked.next_move(&random).unwrap().unwrap();
    assert!(tracked.apply(pending, &mut solution).unwrap().is_none());
    assert!(!tracked.has_outstanding_move());
    assert_eq!(tracked.report().failed_applies, 1);
}

#[test]
fn test_neighborhood_stop_criteria_ends_sequence() {
    let threads = threads();
    let random = threads.random(0);
    let solution = VectorSolution::zeros(2);
    let mut tracked = TrackedNeighborhood::new(ShiftNeighborhood::new())
        .with_stop_criteria(Box::new(StopTimeIteration::iterations(1)));

    tracked.build(&random, &solution).unwrap();
    let mut yielded = 0;
    while tracked.next_move(&random).unwrap().is_some() {
        yielded += 1;
    }
    assert_eq!(yielded, 2);

    tracked.build(&random, &solution).unwrap();
    assert!(tracked.next_move(&random).unwrap().is_some());
}

#[test]
fn test_failing_neighborhood_propagates() {
    let threads = threads();
    let random = threads.random(0);
    let mut tracked = TrackedNeighborhood::new(FailingNeighborhood);

    tracked.build(&random, &VectorSolution::zeros(1)).unwrap();
    assert!(matches!(
        tracked.next_move(&random),
        Err(metaforge_core::MetaforgeError::Movement { .. })
    ));
}

#[test]
fn test_clone_gets_new_identity_and_empty_report() {
    let threads = threads();
    let random = threads.random(0);
    let mut tracked = TrackedNeighborhood::new(ShiftNeighborhood::new());
    tracked.build(&random, &VectorSolution::zeros(1)).unwrap();

    let copy = tracked.clone();
    assert_ne!(copy.id(), tracked.id());
    assert_eq!(copy.report().searches, 0);
    assert!(copy.clone().next_move(&random).unwrap_err().is_exhausted());
}

#[test]
fn test_composite_unapplies_only_applied_in_reverse() {
    let log = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut composite: CompositeMovement<VectorSolution> = CompositeMovement::new(vec![
        Box::new(ShiftMove::new(0, 1).with_log(log.clone())),
        Box::new(ShiftMove::new(5, 2).with_log(log.clone())),
        Box::new(ShiftMove::new(1, 3).with_log(log.clone())),
    ]);
    let mut solution = VectorSolution::zeros(2);

    assert!(composite.apply(&mut solution).unwrap());
    assert_eq!(solution.values, vec![1, 3]);
    composite.unapply(&mut solution).unwrap();
    assert_eq!(solution.values, vec![0, 0]);

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            LogEntry::Applied(1),
            LogEntry::Applied(3),
            LogEntry::Unapplied(3),
            LogEntry::Unapplied(1),
        ]
    );
}

#[test]
fn test_composite_fails_when_nothing_applies() {
    let mut composite: CompositeMovement<VectorSolution> =
        CompositeMovement::new(vec![Box::new(ShiftMove::new(9, 1))]);
    let mut solution = VectorSolution::zeros(1);

    assert!(!composite.apply(&mut solution).unwrap());
    assert_eq!(solution.values, vec![0]);
}

#[test]
fn test_composite_cost_override() {
    let composite: CompositeMovement<VectorSolution> =
        CompositeMovement::new(vec![Box::new(ShiftMove::new(0, 1))]).with_cost(-10.0);
    assert_eq!(composite.cost(), -10.0);
}

fn ids(
    selection: &mut NeighborhoodSelection<VectorSolution>,
    random: &metaforge_core::ThreadRandom<'_>,
    n: usize,
) -> Vec<usize> {
    (0..n).map(|_| selection.next_index(random).unwrap()).collect()
}

#[test]
fn test_list_selection_order() {
    let threads = threads();
    let random = threads.random(0);
    let mut selection = NeighborhoodSelection::list(false)
        .with(ShiftNeighborhood::new())
        .with(ShiftNeighborhood::new())
        .with(ShiftNeighborhood::new());

    selection.reset(&random);
    assert_eq!(ids(&mut selection, &random, 3), vec![0, 1, 2]);
    assert!(selection.next_index(&random).unwrap_err().is_exhausted());
}

#[test]
fn test_circular_list_wraps() {
    let threads = threads();
    let random = threads.random(0);
    let mut selection = NeighborhoodSelection::list(true)
        .with(ShiftNeighborhood::new())
        .with(ShiftNeighborhood::new());

    assert_eq!(ids(&mut selection, &random, 5), vec![0, 1, 0, 1, 0]);
}

#[test]
fn test_empty_selection_is_exhausted() {
    let threads = threads();
    let random = threads.random(0);
    let mut selection: NeighborhoodSelection<VectorSolution> = NeighborhoodSelection::list(true);

    assert!(selection.next(&random).unwrap_err().is_exhausted());
}

#[test]
fn test_random_selection_is_permutation_and_reproducible() {
    let order = |seed| {
        let threads = ThreadManager::single(Some(seed));
        let random = threads.random(0);
        let mut selection = NeighborhoodSelection::random(false);
        for _ in 0..6 {
            selection = selection.with(ShiftNeighborhood::new());
        }
        selection.reset(&random);
        ids(&mut selection, &random, 6)
    };

    let first = order(11);
    let mut sorted = first.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(first, order(11));
}

#[test]
fn test_probability_selection_prefers_heavy_weight() {
    let threads = threads();
    let random = threads.random(0);
    let mut selection = NeighborhoodSelection::probability(false)
        .with_weighted(ShiftNeighborhood::new(), 0.0)
        .unwrap()
        .with_weighted(ShiftNeighborhood::new(), 100.0)
        .unwrap();

    let mut heavy_first = 0;
    for _ in 0..50 {
        selection.reset(&random);
        if selection.next_index(&random).unwrap() == 1 {
            heavy_first += 1;
        }
    }
    assert!(heavy_first >= 49);
}

#[test]
fn test_negative_weight_rejected() {
    let result =
        NeighborhoodSelection::probability(false).with_weighted(ShiftNeighborhood::new(), -1.0);
    assert!(result.is_err());
}

#[test]
fn test_remove_keeps_cursor() {
    let threads = threads();
    let random = threads.random(0);
    let mut selection = NeighborhoodSelection::list(false)
        .with(ShiftNeighborhood::new())
        .with(ShiftNeighborhood::new())
        .with(ShiftNeighborhood::new());
    selection.reset(&random);

    let first_id = selection.next(&random).unwrap().id();
    assert!(selection.remove(first_id).is_some());
    assert_eq!(selection.len(), 2);
    assert_eq!(ids(&mut selection, &random, 2), vec![0, 1]);
    assert!(selection.next_index(&random).is_err());
    assert!(selection.remove(first_id).is_none());
}

#[test]
fn test_selection_clone_is_independent() {
    let threads = threads();
    let random = threads.random(0);
    let mut selection = NeighborhoodSelection::list(false).with(ShiftNeighborhood::new());
    selection.reset(&random);
    selection
        .next(&random)
        .unwrap()
        .build(&random, &VectorSolution::zeros(1))
        .unwrap();

    let mut copy = selection.clone();
    let original_id = selection.neighborhoods().next().unwrap().id();
    let copy_nb = copy.next(&random).unwrap();
    assert_ne!(copy_nb.id(), original_id);
    assert_eq!(copy_nb.report().searches, 0);
    assert_eq!(selection.reports()[0].1.searches, 1);
}

proptest! {
    #[test]
    fn test_apply_unapply_restores_solution(
        values in proptest::collection::vec(-50i64..50, 1..8),
        index in 0usize..10,
        delta in -20i64..20,
    ) {
        let mut solution = VectorSolution::new(values);
        let hash = solution.solution_hash();
        let canonical = solution.canonical_form();

        let mut movement = ShiftMove::new(index, delta);
        if movement.apply(&mut solution).unwrap() {
            movement.unapply(&mut solution).unwrap();
        }

        prop_assert_eq!(solution.solution_hash(), hash);
        prop_assert_eq!(solution.canonical_form(), canonical);
    }
}

#[test]
fn test_unapply_counts_infeasible_kinds() {
    use metaforge_core::{ConstraintEvaluation, ConstraintKind};

    let threads = threads();
    let random = threads.random(0);
    let mut solution = VectorSolution::zeros(1);
    let mut tracked = TrackedNeighborhood::new(ScriptedNeighborhood::new(0, vec![1]));
    tracked.build(&random, &solution).unwrap();
    let pending = tracked.next_move(&random).unwrap().unwrap();
    let applied = tracked.apply(pending, &mut solution).unwrap().unwrap();

    let discarded = Evaluation::new(
        1.0,
        vec![ConstraintEvaluation::violated(ConstraintKind::new("capacity"), 2.0)],
    );
    tracked.unapply(applied, &mut solution, &discarded).unwrap();

    assert_eq!(
        tracked.report().constraint_per_unapply.get(&ConstraintKind::new("capacity")),
        Some(&1)
    );
}

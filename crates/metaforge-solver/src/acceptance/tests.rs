//! Tests for acceptance criteria.

use super::*;
use crate::memory::SolutionMemory;
use metaforge_core::{ConstraintEvaluation, ConstraintKind, ThreadManager};
use metaforge_test::VectorSolution;

fn obj(value: f64) -> Evaluation {
    Evaluation::from_objective(value)
}

fn infeasible(value: f64) -> Evaluation {
    Evaluation::new(
        value,
        vec![ConstraintEvaluation::violated(ConstraintKind::new("c"), 0.0)],
    )
}

fn accept_with<A: AcceptanceCriteria<VectorSolution>>(
    criteria: &mut A,
    threads: &ThreadManager,
    current: f64,
    candidate: f64,
) -> bool {
    criteria.accept(
        &obj(current),
        &obj(candidate),
        &VectorSolution::zeros(1),
        &threads.random(0),
    )
}

#[test]
fn test_better_requires_strict_improvement() {
    let threads = ThreadManager::single(Some(0));
    let mut better = Better::new();
    assert!(accept_with(&mut better, &threads, 10.0, 9.0));
    assert!(!accept_with(&mut better, &threads, 10.0, 10.0));
    assert!(!accept_with(&mut better, &threads, 10.0, 11.0));
}

#[test]
fn test_better_or_same_accepts_equal() {
    let threads = ThreadManager::single(Some(0));
    let mut criteria = BetterOrSame::new();
    assert!(accept_with(&mut criteria, &threads, 10.0, 10.0));
    assert!(!accept_with(&mut criteria, &threads, 10.0, 10.5));

    let copy: Box<dyn AcceptanceCriteria<VectorSolution>> = criteria.box_clone();
    assert!(format!("{:?}", copy).contains("BetterOrSame"));
}

#[test]
fn test_threshold_scenario() {
    let threads = ThreadManager::single(Some(0));
    let mut threshold = Threshold::new(10.0, 0.0, 5).unwrap();
    assert_eq!(threshold.current_threshold(), 10.0);

    // Iteration 0: threshold 10 rejects an improvement of 1.
    assert!(!accept_with(&mut threshold, &threads, 20.0, 19.0));
    AcceptanceCriteria::<VectorSolution>::reset(&mut threshold);
    // An improvement of 11 beats the same threshold.
    assert!(accept_with(&mut threshold, &threads, 20.0, 9.0));
}

#[test]
fn test_threshold_decreases_every_call() {
    let threads = ThreadManager::single(Some(0));
    let mut threshold = Threshold::new(10.0, 0.0, 5).unwrap();
    let mut seen = Vec::new();
    for _ in 0..6 {
        seen.push(threshold.current_threshold());
        accept_with(&mut threshold, &threads, 0.0, 100.0);
    }
    assert_eq!(seen, vec![10.0, 8.0, 6.0, 4.0, 2.0, 0.0]);
    // Stays at zero past iter_max.
    assert_eq!(threshold.current_threshold(), 0.0);

    AcceptanceCriteria::<VectorSolution>::reset(&mut threshold);
    assert_eq!(threshold.iteration(), 0);
}

#[test]
fn test_threshold_schedule_ignores_end_offset() {
    let threads = ThreadManager::single(Some(0));
    let mut threshold = Threshold::new(10.0, 2.0, 4).unwrap();
    // step = 2, so the first threshold is 4 * 2.
    assert_eq!(threshold.current_threshold(), 8.0);

    // A gap of 9 beats 8.
    assert!(accept_with(&mut threshold, &threads, 20.0, 11.0));
    assert_eq!(threshold.current_threshold(), 6.0);
    for _ in 0..3 {
        accept_with(&mut threshold, &threads, 0.0, 100.0);
    }
    assert_eq!(threshold.current_threshold(), 0.0);
}

#[test]
fn test_threshold_rejects_worse_even_at_zero_threshold() {
    let threads = ThreadManager::single(Some(0));
    let mut threshold = Threshold::new(0.0, 0.0, 1).unwrap();
    assert!(!accept_with(&mut threshold, &threads, 5.0, 6.0));
    assert!(accept_with(&mut threshold, &threads, 5.0, 4.0));
}

#[test]
fn test_schedule_validation() {
    assert!(Threshold::new(10.0, 0.0, 0).is_err());
    assert!(Threshold::new(0.0, 10.0, 5).is_err());
    assert!(SimulatedAnnealing::new(f64::NAN, 0.0, 5).is_err());
    assert!(SimulatedAnnealing::new(10.0, -1.0, 5).is_err());
    assert!(SimulatedAnnealing::new(10.0, 0.0, 0).is_err());
}

#[test]
fn test_annealing_accepts_improvements() {
    let threads = ThreadManager::single(Some(0));
    let mut sa = SimulatedAnnealing::new(100.0, 0.0, 10).unwrap();
    for _ in 0..20 {
        assert!(accept_with(&mut sa, &threads, 10.0, 5.0));
    }
}

#[test]
fn test_annealing_rejects_infeasible_worse() {
    let threads = ThreadManager::single(Some(0));
    let mut sa = SimulatedAnnealing::new(1.0e9, 0.0, 10).unwrap();
    let accepted = AcceptanceCriteria::<VectorSolution>::accept(
        &mut sa,
        &obj(10.0),
        &infeasible(1.0),
        &VectorSolution::zeros(1),
        &threads.random(0),
    );
    assert!(!accepted);
}

#[test]
fn test_annealing_hot_accepts_worse_often() {
    let threads = ThreadManager::single(Some(1));
    let mut sa = SimulatedAnnealing::new(1.0e6, 0.0, 1000).unwrap();
    let accepted = (0..200)
        .filter(|_| accept_with(&mut sa, &threads, 10.0, 11.0))
        .count();
    assert!(accepted > 190);
}

#[test]
fn test_annealing_temperature_falls_to_zero_with_end_offset() {
    let threads = ThreadManager::single(Some(3));
    let mut sa = SimulatedAnnealing::new(10.0, 2.0, 4).unwrap();
    let mut seen = Vec::new();
    for _ in 0..4 {
        accept_with(&mut sa, &threads, 10.0, 5.0);
        seen.push(sa.temperature());
    }
    assert_eq!(seen[..3], [6.0, 4.0, 2.0]);
    assert_eq!(seen[3], annealing::MIN_TEMPERATURE);
}

#[test]
fn test_annealing_guard_at_end_of_schedule() {
    let threads = ThreadManager::single(Some(2));
    let mut sa = SimulatedAnnealing::new(10.0, 0.0, 2).unwrap();
    for _ in 0..5 {
        accept_with(&mut sa, &threads, 0.0, 0.0);
    }
    assert_eq!(sa.temperature(), annealing::MIN_TEMPERATURE);
    assert!(sa.temperature() > 0.0);
    // Cold: worse candidates are rejected, equal ones still pass.
    assert!(!accept_with(&mut sa, &threads, 10.0, 11.0));
    assert!(accept_with(&mut sa, &threads, 10.0, 10.0));
}

#[test]
fn test_annealing_reproducible_with_seed() {
    let run = || {
        let threads = ThreadManager::single(Some(77));
        let mut sa = SimulatedAnnealing::new(5.0, 0.0, 100).unwrap();
        (0..50)
            .map(|_| accept_with(&mut sa, &threads, 10.0, 12.0))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_better_unknown_rate_validation() {
    assert!(BetterUnknownAcceptance::fixed(1.5, SolutionMemory::new()).is_err());
    assert!(BetterUnknownAcceptance::decaying(-0.1, SolutionMemory::new()).is_err());
}

#[test]
fn test_better_unknown_records_and_rejects_known() {
    let threads = ThreadManager::single(Some(0));
    let memory = SolutionMemory::new();
    let mut criteria = BetterUnknownAcceptance::fixed(0.0, memory.clone()).unwrap();
    let candidate = VectorSolution::new(vec![1, 2]);

    let first = criteria.accept(&obj(10.0), &obj(5.0), &candidate, &threads.random(0));
    assert!(first);
    assert!(memory.contains("[1,2]"));

    let second = criteria.accept(&obj(10.0), &obj(5.0), &candidate, &threads.random(0));
    assert!(!second);
}

#[test]
fn test_better_unknown_fixed_one_always_accepts_known() {
    let threads = ThreadManager::single(Some(0));
    let memory = SolutionMemory::new();
    memory.insert("[3]".to_string(), 3.0);
    let mut criteria = BetterUnknownAcceptance::fixed(1.0, memory).unwrap();
    let candidate = VectorSolution::new(vec![3]);
    for _ in 0..10 {
        assert!(criteria.accept(&obj(10.0), &obj(3.0), &candidate, &threads.random(0)));
    }
}

#[test]
fn test_better_unknown_still_requires_improvement() {
    let threads = ThreadManager::single(Some(0));
    let memory = SolutionMemory::new();
    let mut criteria = BetterUnknownAcceptance::fixed(1.0, memory.clone()).unwrap();
    let candidate = VectorSolution::new(vec![4]);
    assert!(!criteria.accept(&obj(1.0), &obj(3.0), &candidate, &threads.random(0)));
    assert!(memory.is_empty());
}

#[test]
fn test_box_clone_shares_memory() {
    let memory = SolutionMemory::new();
    let criteria = BetterUnknownAcceptance::decaying(0.5, memory.clone()).unwrap();
    let copy: Box<dyn AcceptanceCriteria<VectorSolution>> = criteria.box_clone();
    let threads = ThreadManager::single(Some(0));
    let mut copy = copy;
    copy.accept(&obj(2.0), &obj(1.0), &VectorSolution::new(vec![9]), &threads.random(0));
    assert!(memory.contains("[9]"));
}

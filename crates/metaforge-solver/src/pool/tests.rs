use std::sync::Arc;

use metaforge_core::{Evaluator, ThreadManager};
use metaforge_test::{sum_evaluator, VectorSolution};
use proptest::prelude::*;

use super::*;

fn v(values: &[i64]) -> VectorSolution {
    VectorSolution::new(values.to_vec())
}

fn objectives(pool: &dyn Pool<VectorSolution>) -> Vec<i64> {
    pool.solutions().iter().map(VectorSolution::sum).collect()
}

#[test]
fn test_list_pool_accepts_everything() {
    let evaluator = sum_evaluator();
    let mut pool = ListPool::new();

    assert!(pool.add(v(&[3]), &evaluator));
    assert!(pool.add(v(&[3]), &evaluator));
    assert!(pool.add(v(&[1]), &evaluator));

    assert_eq!(pool.len(), 3);
    assert_eq!(pool.get_best(&evaluator).unwrap().values, vec![1]);
    assert_eq!(pool.stats(), PoolStats { offered: 3, accepted: 3 });

    pool.clear();
    assert!(pool.is_empty());
    assert!(pool.get_best(&evaluator).is_none());
}

#[test]
fn test_get_best_prefers_first_on_ties() {
    let evaluator = sum_evaluator();
    let mut pool = ListPool::new();
    pool.add(v(&[2, 0]), &evaluator);
    pool.add(v(&[0, 2]), &evaluator);

    assert_eq!(pool.get_best(&evaluator).unwrap().values, vec![2, 0]);
}

#[test]
fn test_zero_limit_is_configuration_error() {
    assert!(ElitePool::<VectorSolution>::new(0).is_err());
    assert!(EliteDiversePool::<VectorSolution>::new(0, 0.5).is_err());
    assert!(EliteDiversePool::<VectorSolution>::new(2, -1.0).is_err());
}

#[test]
fn test_elite_pool_evicts_worst() {
    let evaluator = sum_evaluator();
    let mut pool = ElitePool::new(3).unwrap();
    for value in [5, 9, 7] {
        assert!(pool.add(v(&[value]), &evaluator));
    }

    assert!(!pool.add(v(&[9]), &evaluator));
    assert!(pool.add(v(&[6]), &evaluator));
    let mut kept = objectives(&pool);
    kept.sort_unstable();
    assert_eq!(kept, vec![5, 6, 7]);

    assert!(pool.add(v(&[1]), &evaluator));
    let mut kept = objectives(&pool);
    kept.sort_unstable();
    assert_eq!(kept, vec![1, 5, 6]);
}

#[test]
fn test_elite_pool_rejects_duplicate_when_full() {
    let evaluator = sum_evaluator();
    let mut pool = ElitePool::new(2).unwrap();
    pool.add(v(&[1, 1]), &evaluator);
    pool.add(v(&[5, 5]), &evaluator);

    assert!(!pool.add(v(&[1, 1]), &evaluator));
    assert_eq!(pool.len(), 2);
}

#[test]
fn test_elite_pool_clear_drops_worst_cache() {
    let evaluator = sum_evaluator();
    let mut pool = ElitePool::new(1).unwrap();
    pool.add(v(&[1]), &evaluator);
    assert!(!pool.add(v(&[4]), &evaluator));

    pool.clear();
    assert!(pool.add(v(&[8]), &evaluator));
    assert!(pool.add(v(&[4]), &evaluator));
    assert_eq!(objectives(&pool), vec![4]);
}

#[test]
fn test_box_clone_is_independent() {
    let evaluator = sum_evaluator();
    let mut pool = ElitePool::new(2).unwrap();
    pool.add(v(&[1]), &evaluator);

    let mut copy = pool.box_clone();
    copy.add(v(&[2]), &evaluator);

    assert_ne!(copy.id(), pool.id());
    assert_eq!(pool.len(), 1);
    assert_eq!(copy.len(), 2);
}

#[test]
fn test_diverse_pool_rejects_duplicate_below_limit() {
    let evaluator = sum_evaluator();
    let mut pool = EliteDiversePool::new(5, 0.5).unwrap();

    assert!(pool.add(v(&[1, 2]), &evaluator));
    assert!(!pool.add(v(&[1, 2]), &evaluator));
    assert_eq!(pool.len(), 1);
}

#[test]
fn test_diverse_pool_quality_only() {
    let evaluator = sum_evaluator();
    let mut pool = EliteDiversePool::new(2, 0.0).unwrap();
    pool.add(v(&[10]), &evaluator);
    pool.add(v(&[12]), &evaluator);

    // replaces 12, the best member is protected
    assert!(pool.add(v(&[11]), &evaluator));
    assert_eq!(objectives(&pool), vec![10, 11]);

    assert!(!pool.add(v(&[13]), &evaluator));

    // a new best is always admitted
    assert!(pool.add(v(&[5]), &evaluator));
    assert_eq!(objectives(&pool), vec![10, 5]);
    assert_eq!(pool.best_objective(), 5.0);
}

#[test]
fn test_diverse_candidate_replaces_similar_member() {
    let evaluator = sum_evaluator();
    let mut pool = EliteDiversePool::new(2, 1.0).unwrap();
    pool.add(v(&[10]), &evaluator);
    pool.add(v(&[12]), &evaluator);

    assert!(!pool.add(v(&[11]), &evaluator));
    assert!(pool.add(v(&[40]), &evaluator));
    assert_eq!(objectives(&pool), vec![10, 40]);
}

#[test]
fn test_diverse_pool_never_exceeds_limit() {
    let evaluator = sum_evaluator();
    let mut pool = EliteDiversePool::new(3, 0.2).unwrap();
    for value in [9, 8, 30, 7, 1, 50, 2, 0, -3, 12] {
        pool.add(v(&[value, value % 4]), &evaluator);
        assert!(pool.len() <= 3);
    }
    assert_eq!(pool.stats().offered, 10);
}

#[test]
fn test_action_on_add_polishes_new_best() {
    let evaluator = sum_evaluator();
    let action: AddAction<VectorSolution> = Arc::new(|solution: &mut VectorSolution| {
        for value in &mut solution.values {
            *value -= 1;
        }
    });
    let mut pool = EliteDiversePool::new(2, 0.0).unwrap().with_action_on_add(action);

    pool.add(v(&[4]), &evaluator);
    pool.add(v(&[9]), &evaluator);

    assert_eq!(objectives(&pool), vec![3, 9]);
    assert_eq!(pool.best_objective(), 3.0);
}

#[test]
fn test_shared_pool_shares_and_deep_copies() {
    let evaluator = sum_evaluator();
    let shared = SharedPool::new(Box::new(ListPool::<VectorSolution>::new()));
    let handle = shared.clone();
    handle.add(v(&[3]), &evaluator);

    assert_eq!(shared.len(), 1);
    assert_eq!(shared.best(&evaluator).unwrap().values, vec![3]);

    let copy = shared.deep_copy();
    copy.add(v(&[1]), &evaluator);
    assert_eq!(shared.len(), 1);
    assert_eq!(copy.len(), 2);
    assert_eq!(copy.member(1).unwrap().values, vec![1]);
}

#[test]
fn test_shared_pool_random_member() {
    let evaluator = sum_evaluator();
    let threads = ThreadManager::single(Some(5));
    let shared = SharedPool::new(Box::new(ListPool::<VectorSolution>::new()));
    assert!(shared.random_member(&threads.random(0)).is_none());

    shared.add(v(&[1]), &evaluator);
    shared.add(v(&[2]), &evaluator);
    let member = shared.random_member(&threads.random(0)).unwrap();
    assert!(member.values == vec![1] || member.values == vec![2]);
}

proptest! {
    #[test]
    fn test_elite_pool_admission_keeps_better_members(
        limit in 1usize..5,
        offers in proptest::collection::vec(-30i64..30, 1..40),
    ) {
        let evaluator = sum_evaluator();
        let mut pool = ElitePool::new(limit).unwrap();
        for value in offers {
            let before = objectives(&pool);
            let full = before.len() == limit;
            let accepted = pool.add(v(&[value]), &evaluator);
            prop_assert!(pool.len() <= limit);

            if accepted && full {
                let evicted = before.iter().copied().max().unwrap();
                for member in pool.solutions() {
                    let objective = evaluator.evaluate(member).objective();
                    prop_assert!(objective <= evicted as f64);
                }
            }
        }
    }
}

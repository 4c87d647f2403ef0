//! Bounded and unbounded solution pools.
//!
//! A pool decides on every [`Pool::add`] whether the offered solution
//! enters. [`ListPool`] keeps everything, [`ElitePool`] keeps the best
//! `limit` distinct solutions and [`EliteDiversePool`] blends quality and
//! novelty into its eviction score. [`SharedPool`] puts any pool behind a
//! mutex for use by several workers.

mod elite;
mod elite_diverse;
mod list;
mod shared;

use std::fmt::Debug;

use metaforge_core::{EntityId, Evaluation, Evaluator, Solution};
use tracing::trace;

pub use elite::ElitePool;
pub use elite_diverse::{AddAction, EliteDiversePool};
pub use list::ListPool;
pub use shared::SharedPool;

/// Offered and admitted counts of a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub offered: u64,
    pub accepted: u64,
}

impl PoolStats {
    /// Records one offer and emits the admission event.
    pub(crate) fn record(
        &mut self,
        pool: &'static str,
        id: EntityId,
        accepted: bool,
        evaluation: &Evaluation,
        diversity: f64,
    ) {
        self.offered += 1;
        if accepted {
            self.accepted += 1;
        }
        trace!(
            event = "pool_add",
            pool,
            id = %id,
            accepted,
            objective = evaluation.objective(),
            diversity,
            infeasible = evaluation.is_infeasible(),
        );
    }
}

/// Repository of solutions with an admission policy.
pub trait Pool<S: Solution>: Send + Debug {
    fn name(&self) -> &'static str;

    fn id(&self) -> EntityId;

    /// Offers `solution`; true if it was admitted.
    fn add(&mut self, solution: S, evaluator: &dyn Evaluator<S>) -> bool;

    /// Members in admission order.
    fn solutions(&self) -> &[S];

    fn clear(&mut self);

    fn stats(&self) -> PoolStats;

    /// Deep, independent copy of the pool and its members.
    fn box_clone(&self) -> Box<dyn Pool<S>>;

    fn len(&self) -> usize {
        self.solutions().len()
    }

    fn is_empty(&self) -> bool {
        self.solutions().is_empty()
    }

    fn get(&self, index: usize) -> Option<&S> {
        self.solutions().get(index)
    }

    /// Best member by `evaluator`; the first one wins ties.
    fn get_best(&self, evaluator: &dyn Evaluator<S>) -> Option<&S> {
        best_of(self.solutions(), evaluator).map(|(index, _)| &self.solutions()[index])
    }
}

/// Index and evaluation of the best of `solutions`.
pub(crate) fn best_of<S>(
    solutions: &[S],
    evaluator: &dyn Evaluator<S>,
) -> Option<(usize, Evaluation)> {
    let mut iter = solutions.iter().enumerate();
    let (_, first) = iter.next()?;
    let mut best = (0, evaluator.evaluate(first));
    for (index, solution) in iter {
        let evaluation = evaluator.evaluate(solution);
        if evaluation.better_than(&best.1) {
            best = (index, evaluation);
        }
    }
    Some(best)
}

impl<S: Solution> Clone for Box<dyn Pool<S>> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

#[cfg(test)]
mod tests;

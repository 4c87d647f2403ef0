use std::slice;
use std::sync::Arc;

use metaforge_core::{Evaluator, MetaforgeError, Result, Solution};

use super::{contained_failure, HeuristicCore, MetaHeuristic};
use crate::context::SearchContext;
use crate::pool::Pool;
use crate::stop::StopCriteria;

/// Iterated local search over a solution pool.
///
/// Every iteration applies the perturbation `perturbations` times, runs
/// the local search and offers the result to the pool. Whenever the
/// change-solution criteria fires, the search restarts from a random pool
/// member. The run returns the best pool member.
#[derive(Debug)]
pub struct Ils<S: Solution> {
    core: HeuristicCore<S>,
    perturbation: Box<dyn MetaHeuristic<S>>,
    local_search: Box<dyn MetaHeuristic<S>>,
    perturbations: usize,
    pool: Box<dyn Pool<S>>,
    change_solution: Box<dyn StopCriteria>,
}

impl<S: Solution> Ils<S> {
    pub fn new(
        stop: Box<dyn StopCriteria>,
        evaluator: Arc<dyn Evaluator<S>>,
        perturbation: Box<dyn MetaHeuristic<S>>,
        local_search: Box<dyn MetaHeuristic<S>>,
        perturbations: usize,
        pool: Box<dyn Pool<S>>,
        change_solution: Box<dyn StopCriteria>,
    ) -> Self {
        Self {
            core: HeuristicCore::new(stop, evaluator),
            perturbation,
            local_search,
            perturbations,
            pool,
            change_solution,
        }
    }

    pub fn pool(&self) -> &dyn Pool<S> {
        self.pool.as_ref()
    }

    fn iterate(&mut self, mut current: S, ctx: &SearchContext<'_>) -> Result<S> {
        for _ in 0..self.perturbations {
            current = self.perturbation.run_operation(current, ctx)?;
        }
        self.local_search.run_operation(current, ctx)
    }
}

impl<S: Solution> MetaHeuristic<S> for Ils<S> {
    fn name(&self) -> &'static str {
        "ILS"
    }

    fn core(&self) -> &HeuristicCore<S> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut HeuristicCore<S> {
        &mut self.core
    }

    fn run(&mut self, solution: S, ctx: &SearchContext<'_>) -> Result<S> {
        let random = ctx.random();
        let evaluator = Arc::clone(self.core.evaluator());
        let stop = Arc::clone(self.core.stop_criteria());
        let seed_eval = evaluator.evaluate(&solution);
        self.pool.clear();
        self.change_solution.reset();

        let mut current = solution.clone();
        loop {
            let best_eval = self
                .pool
                .get_best(evaluator.as_ref())
                .map(|best| evaluator.evaluate(best))
                .unwrap_or_else(|| seed_eval.clone());
            if ctx.should_stop_on(slice::from_ref(&best_eval)) {
                break;
            }
            self.core.log_best(&best_eval);
            self.change_solution.increment_counter();
            stop.increment_counter();

            current = match self.iterate(current, ctx) {
                Ok(next) => next,
                Err(err) => {
                    contained_failure(self.name(), self.core.id(), &err);
                    self.pool
                        .get_best(evaluator.as_ref())
                        .cloned()
                        .unwrap_or_else(|| solution.clone())
                }
            };
            self.core.log_current(&evaluator.evaluate(&current));
            self.pool.add(current.clone(), evaluator.as_ref());

            if self.change_solution.stop() {
                if !self.pool.is_empty() {
                    let index = random.next_in_range(0..self.pool.len());
                    if let Some(member) = self.pool.get(index) {
                        current = member.clone();
                    }
                }
                self.change_solution.reset();
            }
        }

        self.pool.add(current, evaluator.as_ref());
        self.pool.add(solution, evaluator.as_ref());
        self.pool
            .get_best(evaluator.as_ref())
            .cloned()
            .ok_or_else(|| MetaforgeError::exhausted("ILS solution pool"))
    }

    fn box_clone(&self) -> Box<dyn MetaHeuristic<S>> {
        Box::new(Self {
            core: self.core.fork(),
            perturbation: self.perturbation.box_clone(),
            local_search: self.local_search.box_clone(),
            perturbations: self.perturbations,
            pool: self.pool.box_clone(),
            change_solution: self.change_solution.box_clone(),
        })
    }

    fn children(&self) -> Vec<&dyn MetaHeuristic<S>> {
        vec![self.perturbation.as_ref(), self.local_search.as_ref()]
    }
}

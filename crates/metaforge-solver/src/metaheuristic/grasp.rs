use std::slice;
use std::sync::Arc;

use metaforge_core::{Evaluator, Result, Solution};
use tracing::debug;

use super::{contained_failure, HeuristicCore, MetaHeuristic};
use crate::acceptance::AcceptanceCriteria;
use crate::context::SearchContext;
use crate::stop::StopCriteria;

/// Alternates a construction and a local search from the same seed.
///
/// Every iteration constructs from a fresh copy of the input, improves the
/// result with the local search and keeps it if the acceptance criteria
/// prefers it over the best so far.
#[derive(Debug)]
pub struct Grasp<S: Solution> {
    core: HeuristicCore<S>,
    construction: Box<dyn MetaHeuristic<S>>,
    local_search: Box<dyn MetaHeuristic<S>>,
    acceptance: Box<dyn AcceptanceCriteria<S>>,
}

impl<S: Solution> Grasp<S> {
    pub fn new(
        stop: Box<dyn StopCriteria>,
        evaluator: Arc<dyn Evaluator<S>>,
        construction: Box<dyn MetaHeuristic<S>>,
        local_search: Box<dyn MetaHeuristic<S>>,
        acceptance: Box<dyn AcceptanceCriteria<S>>,
    ) -> Self {
        Self {
            core: HeuristicCore::new(stop, evaluator),
            construction,
            local_search,
            acceptance,
        }
    }

    fn iterate(&mut self, seed: S, ctx: &SearchContext<'_>) -> Result<S> {
        let constructed = self.construction.run_operation(seed, ctx)?;
        self.local_search.run_operation(constructed, ctx)
    }
}

impl<S: Solution> MetaHeuristic<S> for Grasp<S> {
    fn name(&self) -> &'static str {
        "GRASP"
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
        let mut best = solution.clone();
        let mut best_eval = evaluator.evaluate(&best);
        self.acceptance.reset();

        while !ctx.should_stop_on(slice::from_ref(&best_eval)) {
            stop.increment_counter();
            let candidate = match self.iterate(solution.clone(), ctx) {
                Ok(candidate) => candidate,
                Err(err) => {
                    contained_failure(self.name(), self.core.id(), &err);
                    continue;
                }
            };
            let evaluation = evaluator.evaluate(&candidate);
            self.core.log_current(&evaluation);
            if self
                .acceptance
                .accept(&best_eval, &evaluation, &candidate, &random)
            {
                debug!(
                    event = "best_improved",
                    metaheuristic = "GRASP",
                    objective = evaluation.objective(),
                );
                best = candidate;
                best_eval = evaluation;
            }
            self.core.log_best(&best_eval);
        }
        Ok(best)
    }

    fn box_clone(&self) -> Box<dyn MetaHeuristic<S>> {
        Box::new(Self {
            core: self.core.fork(),
            construction: self.construction.box_clone(),
            local_search: self.local_search.box_clone(),
            acceptance: self.acceptance.box_clone(),
        })
    }

    fn children(&self) -> Vec<&dyn MetaHeuristic<S>> {
        vec![self.construction.as_ref(), self.local_search.as_ref()]
    }
}

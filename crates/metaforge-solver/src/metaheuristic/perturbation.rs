use std::slice;
use std::sync::Arc;

use metaforge_core::{Evaluator, Result, Solution};

use super::first_improvement::first_accepted;
use super::{contained_failure, HeuristicCore, MetaHeuristic, PassOutcome};
use crate::context::SearchContext;
use crate::heuristic::NeighborhoodSelection;
use crate::stop::StopCriteria;

/// Randomizing kick: commits the first movement that applies, worse or not.
///
/// Infeasible results are rejected unless `accept_infeasible` is set.
/// Used by ILS and the genetic algorithm as their mutation step.
#[derive(Debug)]
pub struct Pertubation<S: Solution> {
    core: HeuristicCore<S>,
    selection: NeighborhoodSelection<S>,
    accept_infeasible: bool,
}

impl<S: Solution> Pertubation<S> {
    pub fn new(
        stop: Box<dyn StopCriteria>,
        evaluator: Arc<dyn Evaluator<S>>,
        selection: NeighborhoodSelection<S>,
        accept_infeasible: bool,
    ) -> Self {
        Self {
            core: HeuristicCore::new(stop, evaluator),
            selection,
            accept_infeasible,
        }
    }

    pub fn accepts_infeasible(&self) -> bool {
        self.accept_infeasible
    }
}

impl<S: Solution> MetaHeuristic<S> for Pertubation<S> {
    fn name(&self) -> &'static str {
        "Pertubation"
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
        let backup = solution.clone();
        let mut current = solution;
        let mut best_eval = evaluator.evaluate(&current);
        evaluator.save_evaluation_state(&current);
        let accept_infeasible = self.accept_infeasible;

        let mut idle = 0;
        while !ctx.should_stop_on(slice::from_ref(&best_eval)) {
            let Ok(neighborhood) = self.selection.next(&random) else {
                break;
            };
            let (name, id) = (neighborhood.name(), neighborhood.id());
            let pass = first_accepted(
                neighborhood,
                &mut self.core,
                ctx,
                &mut current,
                &mut best_eval,
                |_, candidate, _, _| accept_infeasible || !candidate.is_infeasible(),
            );
            match pass {
                Ok(PassOutcome::Improved) => {
                    evaluator.save_evaluation_state(&current);
                    return Ok(current);
                }
                Ok(PassOutcome::NoImprovement) => idle += 1,
                Err(err) => {
                    contained_failure(name, id, &err);
                    current = backup.clone();
                    best_eval = evaluator.evaluate(&current);
                    idle += 1;
                }
            }
            if idle >= self.selection.len() {
                break;
            }
        }
        evaluator.save_evaluation_state(&current);
        Ok(current)
    }

    fn box_clone(&self) -> Box<dyn MetaHeuristic<S>> {
        Box::new(Self {
            core: self.core.fork(),
            selection: self.selection.clone(),
            accept_infeasible: self.accept_infeasible,
        })
    }

    fn neighborhood_selection(&self) -> Option<&NeighborhoodSelection<S>> {
        Some(&self.selection)
    }

    fn neighborhood_selection_mut(&mut self) -> Option<&mut NeighborhoodSelection<S>> {
        Some(&mut self.selection)
    }
}

use std::slice;
use std::sync::Arc;

use metaforge_core::{Evaluation, Evaluator, Result, Solution};
use tracing::debug;

use super::{contained_failure, HeuristicCore, MetaHeuristic, PassOutcome};
use crate::acceptance::AcceptanceCriteria;
use crate::context::SearchContext;
use crate::heuristic::{NeighborhoodSelection, TrackedNeighborhood};
use crate::stop::StopCriteria;

/// Tries every movement of a neighborhood and commits the best accepted one.
///
/// Each candidate is applied, evaluated and unapplied; acceptance compares
/// it against the best solution so far. After a pass the best solution
/// becomes the current one and the next neighborhood is consulted.
///
/// The run ends when the stop chain fires, when a non-circular selection
/// runs out, or when every neighborhood in a row failed to improve.
#[derive(Debug)]
pub struct BestImprovement<S: Solution> {
    core: HeuristicCore<S>,
    selection: NeighborhoodSelection<S>,
    acceptance: Box<dyn AcceptanceCriteria<S>>,
}

impl<S: Solution> BestImprovement<S> {
    pub fn new(
        stop: Box<dyn StopCriteria>,
        evaluator: Arc<dyn Evaluator<S>>,
        selection: NeighborhoodSelection<S>,
        acceptance: Box<dyn AcceptanceCriteria<S>>,
    ) -> Self {
        Self {
            core: HeuristicCore::new(stop, evaluator),
            selection,
            acceptance,
        }
    }
}

/// Scans one neighborhood; `best` and `best_eval` track the best accepted
/// candidate, `current` is left as it was.
fn scan<S: Solution>(
    neighborhood: &mut TrackedNeighborhood<S>,
    acceptance: &mut dyn AcceptanceCriteria<S>,
    core: &mut HeuristicCore<S>,
    ctx: &SearchContext<'_>,
    current: &mut S,
    best: &mut S,
    best_eval: &mut Evaluation,
) -> Result<PassOutcome> {
    let random = ctx.random();
    let evaluator = Arc::clone(core.evaluator());
    let stop = Arc::clone(core.stop_criteria());

    if !neighborhood.build(&random, current)? {
        return Ok(PassOutcome::NoImprovement);
    }
    let mut outcome = PassOutcome::NoImprovement;
    while !ctx.should_stop_on(slice::from_ref(best_eval)) {
        let Some(pending) = neighborhood.next_move(&random)? else {
            break;
        };
        stop.increment_counter();
        let Some(applied) = neighborhood.apply(pending, current)? else {
            continue;
        };

        let evaluation = evaluator.evaluate(current);
        core.log_current(&evaluation);
        if acceptance.accept(best_eval, &evaluation, current, &random) {
            neighborhood.record_improvement(best_eval.objective() - evaluation.objective());
            *best = current.clone();
            *best_eval = evaluation.clone();
            outcome = PassOutcome::Improved;
        }
        neighborhood.unapply(applied, current, &evaluation)?;
        evaluator.update_evaluation_after_unapply(current);
        core.log_best(best_eval);
    }
    Ok(outcome)
}

impl<S: Solution> MetaHeuristic<S> for BestImprovement<S> {
    fn name(&self) -> &'static str {
        "BestImprovement"
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
        let mut current = solution;
        let mut best = current.clone();
        let mut best_eval = evaluator.evaluate(&best);
        evaluator.save_evaluation_state(&current);
        self.acceptance.reset();

        let mut idle = 0;
        while !ctx.should_stop_on(slice::from_ref(&best_eval)) {
            let Ok(neighborhood) = self.selection.next(&random) else {
                break;
            };
            let (name, id) = (neighborhood.name(), neighborhood.id());
            let pass = scan(
                neighborhood,
                self.acceptance.as_mut(),
                &mut self.core,
                ctx,
                &mut current,
                &mut best,
                &mut best_eval,
            );
            match pass {
                Ok(PassOutcome::Improved) => {
                    debug!(
                        event = "best_improved",
                        metaheuristic = "BestImprovement",
                        neighborhood = name,
                        objective = best_eval.objective(),
                    );
                    current = best.clone();
                    evaluator.save_evaluation_state(&current);
                    idle = 0;
                }
                Ok(PassOutcome::NoImprovement) => idle += 1,
                Err(err) => {
                    contained_failure(name, id, &err);
                    current = best.clone();
                    idle += 1;
                }
            }
            if idle >= self.selection.len() {
                break;
            }
        }
        evaluator.save_evaluation_state(&best);
        Ok(best)
    }

    fn box_clone(&self) -> Box<dyn MetaHeuristic<S>> {
        Box::new(Self {
            core: self.core.fork(),
            selection: self.selection.clone(),
            acceptance: self.acceptance.box_clone(),
        })
    }

    fn neighborhood_selection(&self) -> Option<&NeighborhoodSelection<S>> {
        Some(&self.selection)
    }

    fn neighborhood_selection_mut(&mut self) -> Option<&mut NeighborhoodSelection<S>> {
        Some(&mut self.selection)
    }
}

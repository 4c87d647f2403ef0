use std::slice;
use std::sync::Arc;

use metaforge_core::{Evaluation, Evaluator, Result, Solution, ThreadRandom};

use super::{contained_failure, HeuristicCore, MetaHeuristic, PassOutcome};
use crate::acceptance::AcceptanceCriteria;
use crate::context::SearchContext;
use crate::heuristic::{NeighborhoodSelection, TrackedNeighborhood};
use crate::stop::StopCriteria;

/// Commits the first movement that `decide` accepts and returns.
///
/// Rejected movements are unapplied. `current` keeps the committed
/// movement on `Improved`.
pub(super) fn first_accepted<S, F>(
    neighborhood: &mut TrackedNeighborhood<S>,
    core: &mut HeuristicCore<S>,
    ctx: &SearchContext<'_>,
    current: &mut S,
    best_eval: &mut Evaluation,
    mut decide: F,
) -> Result<PassOutcome>
where
    S: Solution,
    F: FnMut(&Evaluation, &Evaluation, &S, &ThreadRandom<'_>) -> bool,
{
    let random = ctx.random();
    let evaluator = Arc::clone(core.evaluator());
    let stop = Arc::clone(core.stop_criteria());

    if !neighborhood.build(&random, current)? {
        return Ok(PassOutcome::NoImprovement);
    }
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
        if decide(best_eval, &evaluation, current, &random) {
            neighborhood.accept(applied, best_eval.objective() - evaluation.objective());
            *best_eval = evaluation;
            core.log_best(best_eval);
            return Ok(PassOutcome::Improved);
        }
        neighborhood.unapply(applied, current, &evaluation)?;
        evaluator.update_evaluation_after_unapply(current);
    }
    Ok(PassOutcome::NoImprovement)
}

/// Commits the first accepted movement and returns.
///
/// Neighborhoods are consulted in selection order until one yields an
/// accepted movement. The run returns the input unchanged when the
/// selection runs out or every neighborhood in a row failed.
#[derive(Debug)]
pub struct FirstImprovement<S: Solution> {
    core: HeuristicCore<S>,
    selection: NeighborhoodSelection<S>,
    acceptance: Box<dyn AcceptanceCriteria<S>>,
}

impl<S: Solution> FirstImprovement<S> {
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

impl<S: Solution> MetaHeuristic<S> for FirstImprovement<S> {
    fn name(&self) -> &'static str {
        "FirstImprovement"
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
        self.acceptance.reset();

        let mut idle = 0;
        while !ctx.should_stop_on(slice::from_ref(&best_eval)) {
            let Ok(neighborhood) = self.selection.next(&random) else {
                break;
            };
            let (name, id) = (neighborhood.name(), neighborhood.id());
            let acceptance = &mut self.acceptance;
            let pass = first_accepted(
                neighborhood,
                &mut self.core,
                ctx,
                &mut current,
                &mut best_eval,
                |best, candidate, solution, random| {
                    acceptance.accept(best, candidate, solution, random)
                },
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

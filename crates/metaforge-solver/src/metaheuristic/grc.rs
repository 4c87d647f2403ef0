use std::cmp::Ordering;
use std::slice;
use std::sync::Arc;

use metaforge_core::{Evaluation, Evaluator, MetaforgeError, Result, Solution};

use super::{contained_failure, HeuristicCore, MetaHeuristic};
use crate::acceptance::AcceptanceCriteria;
use crate::context::SearchContext;
use crate::heuristic::{NeighborhoodSelection, PendingMove, TrackedNeighborhood};
use crate::stop::StopCriteria;

/// Above this the candidate list is walked in cost order instead of shuffled.
const GREEDY_ORDER: f64 = 0.9999;
/// At or above this a failed step ends the construction.
const FULL_GREEDINESS: f64 = 0.99999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Improved,
    NoImprovement,
    Empty,
}

/// Greedy randomized construction.
///
/// Each step builds every candidate of one neighborhood, keeps the
/// cheapest `max(1, floor(n * greediness))` of them and tries them in
/// random order (in cost order once greediness is close to 1) until one is
/// accepted. A step without improvement retries once at full greediness;
/// the next accepted movement restores the configured value. A failed
/// step at full greediness ends the construction.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use metaforge_core::ThreadManager;
/// use metaforge_solver::acceptance::Better;
/// use metaforge_solver::context::SearchContext;
/// use metaforge_solver::heuristic::NeighborhoodSelection;
/// use metaforge_solver::metaheuristic::{Grc, MetaHeuristic};
/// use metaforge_solver::stop::StopTimeIteration;
/// use metaforge_test::{distance_evaluator, ShiftNeighborhood, VectorSolution};
///
/// let mut grc = Grc::new(
///     Box::new(StopTimeIteration::iterations(1_000)),
///     Arc::new(distance_evaluator(0)),
///     NeighborhoodSelection::list(false).with(ShiftNeighborhood::new()),
///     Box::new(Better::new()),
///     0.5,
/// )
/// .unwrap();
///
/// let threads = ThreadManager::single(Some(7));
/// let result = grc
///     .run_operation(VectorSolution::new(vec![3, -2]), &SearchContext::root(&threads))
///     .unwrap();
/// assert_eq!(result.values, vec![0, 0]);
/// ```
#[derive(Debug)]
pub struct Grc<S: Solution> {
    core: HeuristicCore<S>,
    selection: NeighborhoodSelection<S>,
    acceptance: Box<dyn AcceptanceCriteria<S>>,
    greediness: f64,
}

impl<S: Solution> Grc<S> {
    pub fn new(
        stop: Box<dyn StopCriteria>,
        evaluator: Arc<dyn Evaluator<S>>,
        selection: NeighborhoodSelection<S>,
        acceptance: Box<dyn AcceptanceCriteria<S>>,
        greediness: f64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&greediness) {
            return Err(MetaforgeError::Configuration(format!(
                "greediness must be in [0, 1], got {}",
                greediness
            )));
        }
        Ok(Self {
            core: HeuristicCore::new(stop, evaluator),
            selection,
            acceptance,
            greediness,
        })
    }

    pub fn greediness(&self) -> f64 {
        self.greediness
    }
}

fn by_cost<S>(a: &PendingMove<S>, b: &PendingMove<S>) -> Ordering {
    a.cost().partial_cmp(&b.cost()).unwrap_or(Ordering::Equal)
}

fn step<S: Solution>(
    neighborhood: &mut TrackedNeighborhood<S>,
    acceptance: &mut dyn AcceptanceCriteria<S>,
    core: &mut HeuristicCore<S>,
    ctx: &SearchContext<'_>,
    greediness: f64,
    current: &mut S,
    best_eval: &mut Evaluation,
) -> Result<Step> {
    let random = ctx.random();
    let evaluator = Arc::clone(core.evaluator());
    let stop = Arc::clone(core.stop_criteria());

    if !neighborhood.build(&random, current)? {
        return Ok(Step::Empty);
    }
    let mut candidates = Vec::new();
    while let Some(pending) = neighborhood.next_move(&random)? {
        candidates.push(pending);
    }
    if candidates.is_empty() {
        return Ok(Step::Empty);
    }

    let chosen = ((candidates.len() as f64 * greediness) as usize).max(1);
    candidates.sort_by(by_cost);
    candidates.truncate(chosen);
    if greediness > GREEDY_ORDER {
        candidates.sort_by(|a, b| by_cost(b, a));
    } else {
        random.shuffle(&mut candidates);
    }

    while let Some(pending) = candidates.pop() {
        if ctx.should_stop_on(slice::from_ref(best_eval)) {
            break;
        }
        stop.increment_counter();
        let Some(applied) = neighborhood.apply(pending, current)? else {
            continue;
        };
        let evaluation = evaluator.evaluate(current);
        core.log_current(&evaluation);
        if acceptance.accept(best_eval, &evaluation, current, &random) {
            neighborhood.accept(applied, best_eval.objective() - evaluation.objective());
            *best_eval = evaluation;
            core.log_best(best_eval);
            return Ok(Step::Improved);
        }
        neighborhood.unapply(applied, current, &evaluation)?;
        evaluator.update_evaluation_after_unapply(current);
    }
    Ok(Step::NoImprovement)
}

impl<S: Solution> MetaHeuristic<S> for Grc<S> {
    fn name(&self) -> &'static str {
        "GRC"
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
        let mut last_good = current.clone();
        let mut best_eval = evaluator.evaluate(&current);
        self.acceptance.reset();

        let Ok(neighborhood) = self.selection.next(&random) else {
            return Ok(current);
        };
        let (name, id) = (neighborhood.name(), neighborhood.id());
        let mut greediness = self.greediness;
        let mut restore = None;

        while !ctx.should_stop_on(slice::from_ref(&best_eval)) {
            let outcome = step(
                neighborhood,
                self.acceptance.as_mut(),
                &mut self.core,
                ctx,
                greediness,
                &mut current,
                &mut best_eval,
            );
            match outcome {
                Ok(Step::Improved) => {
                    if let Some(original) = restore.take() {
                        greediness = original;
                    }
                    last_good = current.clone();
                }
                Ok(Step::NoImprovement) => {
                    if greediness > FULL_GREEDINESS {
                        break;
                    }
                    restore = Some(greediness);
                    greediness = 1.0;
                }
                Ok(Step::Empty) => break,
                Err(err) => {
                    contained_failure(name, id, &err);
                    current = last_good;
                    break;
                }
            }
        }
        Ok(current)
    }

    fn box_clone(&self) -> Box<dyn MetaHeuristic<S>> {
        Box::new(Self {
            core: self.core.fork(),
            selection: self.selection.clone(),
            acceptance: self.acceptance.box_clone(),
            greediness: self.greediness,
        })
    }

    fn neighborhood_selection(&self) -> Option<&NeighborhoodSelection<S>> {
        Some(&self.selection)
    }

    fn neighborhood_selection_mut(&mut self) -> Option<&mut NeighborhoodSelection<S>> {
        Some(&mut self.selection)
    }
}

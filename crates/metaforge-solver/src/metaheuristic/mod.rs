//! Search algorithms.
//!
//! Every algorithm implements [`MetaHeuristic`]. Composite algorithms
//! (GRASP, ILS, the parallel variants, the genetic algorithm) own their
//! building blocks as boxed metaheuristics and run them through
//! [`MetaHeuristic::run_operation`], which pushes the caller's stop chain
//! down through the [`SearchContext`].

mod best_improvement;
mod first_improvement;
mod genetic;
mod grasp;
mod grc;
mod ils;
mod multiple;
mod parallel_ils;
mod perturbation;
mod report;

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use metaforge_core::{EntityId, Evaluation, Evaluator, MetaforgeError, Result, Solution};
use tracing::{debug, warn};

use crate::context::SearchContext;
use crate::heuristic::NeighborhoodSelection;
use crate::stop::StopCriteria;
use crate::telemetry::EfficiencyReport;

pub use best_improvement::BestImprovement;
pub use first_improvement::FirstImprovement;
pub use genetic::{GeneticAlgorithm, RandomSelection, TournamentSelection};
pub use grasp::Grasp;
pub use grc::Grc;
pub use ils::Ils;
pub use multiple::GenericMultipleMetaheuristic;
pub use parallel_ils::ParallelIls;
pub use perturbation::Pertubation;
pub use report::{SearchReport, SolutionReport, TrajectoryPoint};

/// State every metaheuristic carries: identity, stop criteria, evaluator
/// and run report.
#[derive(Debug)]
pub struct HeuristicCore<S> {
    id: EntityId,
    stop: Arc<dyn StopCriteria>,
    evaluator: Arc<dyn Evaluator<S>>,
    report: SolutionReport,
}

impl<S> HeuristicCore<S> {
    pub fn new(stop: Box<dyn StopCriteria>, evaluator: Arc<dyn Evaluator<S>>) -> Self {
        Self {
            id: EntityId::next(),
            stop: Arc::from(stop),
            evaluator,
            report: SolutionReport::default(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn stop_criteria(&self) -> &Arc<dyn StopCriteria> {
        &self.stop
    }

    pub fn evaluator(&self) -> &Arc<dyn Evaluator<S>> {
        &self.evaluator
    }

    pub fn evaluate(&self, solution: &S) -> Evaluation {
        self.evaluator.evaluate(solution)
    }

    pub fn report(&self) -> &SolutionReport {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut SolutionReport {
        &mut self.report
    }

    pub(crate) fn log_best(&mut self, evaluation: &Evaluation) {
        let stop = &self.stop;
        self.report.log_best(|| stop.current_status(), evaluation);
    }

    pub(crate) fn log_current(&mut self, evaluation: &Evaluation) {
        let stop = &self.stop;
        self.report.log_current(|| stop.current_status(), evaluation);
    }

    /// Copy for another thread: new id, fresh stop criteria and report.
    pub fn fork(&self) -> Self {
        Self {
            id: EntityId::next(),
            stop: Arc::from(self.stop.box_clone()),
            evaluator: Arc::clone(&self.evaluator),
            report: self.report.fresh(),
        }
    }
}

/// A stateful search algorithm.
///
/// `run` is the algorithm body. Callers go through
/// [`MetaHeuristic::run_operation`], which resets the stop criteria and
/// the neighborhood selection, times the run and logs its outcome.
pub trait MetaHeuristic<S: Solution>: Send + Debug {
    fn name(&self) -> &'static str;

    fn core(&self) -> &HeuristicCore<S>;

    fn core_mut(&mut self) -> &mut HeuristicCore<S>;

    /// Searches from `solution` and returns the best solution found.
    ///
    /// `ctx` already carries this instance's stop criteria.
    fn run(&mut self, solution: S, ctx: &SearchContext<'_>) -> Result<S>;

    /// Deep, independent copy for use on another thread.
    fn box_clone(&self) -> Box<dyn MetaHeuristic<S>>;

    fn neighborhood_selection(&self) -> Option<&NeighborhoodSelection<S>> {
        None
    }

    fn neighborhood_selection_mut(&mut self) -> Option<&mut NeighborhoodSelection<S>> {
        None
    }

    /// Metaheuristics this one composes.
    fn children(&self) -> Vec<&dyn MetaHeuristic<S>> {
        Vec::new()
    }

    /// Efficiency of the operators this instance drives directly.
    fn operator_reports(&self) -> Vec<(&'static str, EfficiencyReport)> {
        self.neighborhood_selection()
            .map(NeighborhoodSelection::reports)
            .unwrap_or_default()
    }

    fn id(&self) -> EntityId {
        self.core().id()
    }

    fn stop_criteria(&self) -> &Arc<dyn StopCriteria> {
        self.core().stop_criteria()
    }

    fn evaluator(&self) -> &Arc<dyn Evaluator<S>> {
        self.core().evaluator()
    }

    fn solution_report(&self) -> &SolutionReport {
        self.core().report()
    }

    /// Records best and current objectives at every iteration.
    fn set_solution_log(&mut self, enabled: bool) {
        self.core_mut().report_mut().set_logging(enabled);
    }

    fn with_solution_log(mut self, enabled: bool) -> Self
    where
        Self: Sized,
    {
        self.set_solution_log(enabled);
        self
    }

    /// Efficiency tree of this instance and its children.
    fn efficiency_report(&self) -> SearchReport {
        SearchReport {
            name: self.name(),
            id: self.id(),
            duration: self.solution_report().last_duration,
            neighborhoods: self.operator_reports(),
            children: self
                .children()
                .into_iter()
                .map(|child| child.efficiency_report())
                .collect(),
        }
    }

    /// Runs the algorithm below `parent`.
    fn run_operation(&mut self, solution: S, parent: &SearchContext<'_>) -> Result<S> {
        let stop = Arc::clone(self.stop_criteria());
        stop.reset();
        let ctx = parent.child(stop.as_ref());
        if let Some(selection) = self.neighborhood_selection_mut() {
            selection.reset(&ctx.random());
        }

        let name = self.name();
        let id = self.id();
        debug!(event = "run_start", metaheuristic = name, id = %id, thread = ctx.thread_id());
        let started = Instant::now();
        let result = self.run(solution, &ctx);
        let elapsed = started.elapsed();
        self.core_mut().report_mut().record_run(elapsed);

        match result {
            Ok(solution) => {
                debug!(
                    event = "run_end",
                    metaheuristic = name,
                    id = %id,
                    thread = ctx.thread_id(),
                    duration_ms = elapsed.as_millis() as u64,
                    objective = self.core().evaluate(&solution).objective(),
                );
                Ok(solution)
            }
            Err(err) => {
                warn!(
                    event = "run_failed",
                    metaheuristic = name,
                    id = %id,
                    thread = ctx.thread_id(),
                    error = %err,
                );
                Err(err)
            }
        }
    }
}

impl<S: Solution> Clone for Box<dyn MetaHeuristic<S>> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Logs a failure that the run loop recovers from.
pub(crate) fn contained_failure(component: &str, id: EntityId, err: &MetaforgeError) {
    warn!(event = "contained_failure", component, id = %id, error = %err);
}

/// Outcome of one pass over a neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PassOutcome {
    Improved,
    NoImprovement,
}

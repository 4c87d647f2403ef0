use std::slice;
use std::sync::Arc;

use metaforge_core::{Evaluator, Result, Solution, WorkerPool};

use super::{contained_failure, HeuristicCore, MetaHeuristic};
use crate::context::SearchContext;
use crate::pool::SharedPool;
use crate::stop::StopCriteria;

/// Perturbation and local search owned by one worker.
#[derive(Debug)]
struct Lineage<S: Solution> {
    perturbation: Box<dyn MetaHeuristic<S>>,
    local_search: Box<dyn MetaHeuristic<S>>,
}

/// Independent ILS lineages on a fixed number of worker threads.
///
/// Each lineage starts from a pool member, perturbs it `perturbations`
/// times, runs its local search and offers the result back to the shared
/// pool. Worker `i` runs on logical thread `ctx.thread_id() + 1 + i`; the
/// calling thread keeps its own stream for drawing pool members, so a run
/// needs `workers + 1` streams from `ctx.thread_id()` on.
///
/// With `repeatable` set every round waits for all workers and merges
/// their results in worker order, so a seeded run is reproducible.
/// Otherwise results merge as soon as they arrive and only idle workers are
/// relaunched.
#[derive(Debug)]
pub struct ParallelIls<S: Solution> {
    core: HeuristicCore<S>,
    perturbation: Box<dyn MetaHeuristic<S>>,
    local_search: Box<dyn MetaHeuristic<S>>,
    perturbations: usize,
    initial: Vec<S>,
    pool: SharedPool<S>,
    workers: usize,
    repeatable: bool,
    change_solution: Box<dyn StopCriteria>,
}

impl<S: Solution> ParallelIls<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stop: Box<dyn StopCriteria>,
        evaluator: Arc<dyn Evaluator<S>>,
        perturbation: Box<dyn MetaHeuristic<S>>,
        local_search: Box<dyn MetaHeuristic<S>>,
        perturbations: usize,
        pool: SharedPool<S>,
        workers: usize,
        repeatable: bool,
        change_solution: Box<dyn StopCriteria>,
    ) -> Self {
        Self {
            core: HeuristicCore::new(stop, evaluator),
            perturbation,
            local_search,
            perturbations,
            initial: Vec::new(),
            pool,
            workers: workers.max(1),
            repeatable,
            change_solution,
        }
    }

    /// Solutions offered to the pool before the first round.
    pub fn with_initial_solutions(mut self, initial: Vec<S>) -> Self {
        self.initial = initial;
        self
    }

    pub fn pool(&self) -> &SharedPool<S> {
        &self.pool
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn merge(&mut self, lineages: &mut [S], results: Vec<(usize, Result<S>)>) {
        let evaluator = Arc::clone(self.core.evaluator());
        for (worker, result) in results {
            match result {
                Ok(solution) => {
                    self.core.log_current(&evaluator.evaluate(&solution));
                    lineages[worker] = solution.clone();
                    self.pool.add(solution, evaluator.as_ref());
                }
                Err(err) => contained_failure("ParallelILS worker", self.core.id(), &err),
            }
        }
    }
}

fn run_lineage<S: Solution>(
    lineage: &mut Lineage<S>,
    perturbations: usize,
    mut current: S,
    ctx: &SearchContext<'_>,
) -> Result<S> {
    for _ in 0..perturbations {
        current = lineage.perturbation.run_operation(current, ctx)?;
    }
    lineage.local_search.run_operation(current, ctx)
}

impl<S: Solution> MetaHeuristic<S> for ParallelIls<S> {
    fn name(&self) -> &'static str {
        "ParallelILS"
    }

    fn core(&self) -> &HeuristicCore<S> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut HeuristicCore<S> {
        &mut self.core
    }

    fn run(&mut self, solution: S, ctx: &SearchContext<'_>) -> Result<S> {
        let base = ctx.thread_id();
        ctx.threads().ensure_threads(base, self.workers + 1)?;
        let random = ctx.random();
        let evaluator = Arc::clone(self.core.evaluator());
        let stop = Arc::clone(self.core.stop_criteria());

        self.pool.add(solution.clone(), evaluator.as_ref());
        for initial in std::mem::take(&mut self.initial) {
            self.pool.add(initial, evaluator.as_ref());
        }
        self.change_solution.reset();

        let states: Vec<Lineage<S>> = (0..self.workers)
            .map(|_| Lineage {
                perturbation: self.perturbation.box_clone(),
                local_search: self.local_search.box_clone(),
            })
            .collect();
        let perturbations = self.perturbations;
        let handler = |worker: usize, lineage: &mut Lineage<S>, job: S| {
            run_lineage(lineage, perturbations, job, &ctx.on_thread(base + 1 + worker))
        };

        let body = |workers: &mut WorkerPool<S, Result<S>>| -> Result<()> {
            let mut lineages: Vec<S> = Vec::with_capacity(self.workers);
            loop {
                let best_eval = self
                    .pool
                    .best(evaluator.as_ref())
                    .map(|best| evaluator.evaluate(&best))
                    .unwrap_or_else(|| evaluator.evaluate(&solution));
                self.core.log_best(&best_eval);
                if ctx.should_stop_on(slice::from_ref(&best_eval)) {
                    break;
                }
                stop.increment_counter();

                let change = self.change_solution.stop();
                self.change_solution.increment_counter();
                if change {
                    self.change_solution.reset();
                }

                for worker in workers.idle_workers() {
                    if change || worker >= lineages.len() {
                        let member = self
                            .pool
                            .random_member(&random)
                            .unwrap_or_else(|| solution.clone());
                        if worker < lineages.len() {
                            lineages[worker] = member;
                        } else {
                            lineages.push(member);
                        }
                    }
                    workers.submit(worker, lineages[worker].clone())?;
                }

                let results = if self.repeatable {
                    workers.wait_all()?
                } else {
                    workers.wait_any()?
                };
                self.merge(&mut lineages, results);
            }
            let remaining = workers.wait_all()?;
            self.merge(&mut lineages, remaining);
            Ok(())
        };
        let (outcome, states) = ctx.threads().run_workers(states, handler, body);

        if let Some(first) = states.into_iter().next() {
            self.perturbation = first.perturbation;
            self.local_search = first.local_search;
        }
        outcome?;

        Ok(self.pool.best(evaluator.as_ref()).unwrap_or(solution))
    }

    fn box_clone(&self) -> Box<dyn MetaHeuristic<S>> {
        Box::new(Self {
            core: self.core.fork(),
            perturbation: self.perturbation.box_clone(),
            local_search: self.local_search.box_clone(),
            perturbations: self.perturbations,
            initial: self.initial.clone(),
            pool: self.pool.deep_copy(),
            workers: self.workers,
            repeatable: self.repeatable,
            change_solution: self.change_solution.box_clone(),
        })
    }

    fn children(&self) -> Vec<&dyn MetaHeuristic<S>> {
        vec![self.perturbation.as_ref(), self.local_search.as_ref()]
    }
}

use std::slice;
use std::sync::Arc;

use metaforge_core::{Evaluator, MetaforgeError, Result, Solution, WorkerPool};

use super::{contained_failure, HeuristicCore, MetaHeuristic};
use crate::context::SearchContext;
use crate::pool::SharedPool;
use crate::stop::StopCriteria;

/// Job for one worker: which stage to run, on which solution.
type StageJob<S> = (usize, S);

/// An ordered list of metaheuristics applied round-robin across workers.
///
/// Every round walks the stages in order. For each stage, idle workers
/// run that stage on their lineage and the results are offered to the
/// shared pool. When the change-solution criteria fires, idle lineages
/// restart from random pool members. Synchronous and asynchronous rounds
/// and the thread layout work as in [`ParallelIls`].
///
/// [`ParallelIls`]: super::ParallelIls
#[derive(Debug)]
pub struct GenericMultipleMetaheuristic<S: Solution> {
    core: HeuristicCore<S>,
    stages: Vec<Box<dyn MetaHeuristic<S>>>,
    pool: SharedPool<S>,
    workers: usize,
    repeatable: bool,
    change_solution: Box<dyn StopCriteria>,
}

impl<S: Solution> GenericMultipleMetaheuristic<S> {
    pub fn new(
        stop: Box<dyn StopCriteria>,
        evaluator: Arc<dyn Evaluator<S>>,
        stages: Vec<Box<dyn MetaHeuristic<S>>>,
        pool: SharedPool<S>,
        workers: usize,
        repeatable: bool,
        change_solution: Box<dyn StopCriteria>,
    ) -> Result<Self> {
        if stages.is_empty() {
            return Err(MetaforgeError::Configuration(
                "at least one metaheuristic stage is required".to_string(),
            ));
        }
        Ok(Self {
            core: HeuristicCore::new(stop, evaluator),
            stages,
            pool,
            workers: workers.max(1),
            repeatable,
            change_solution,
        })
    }

    pub fn pool(&self) -> &SharedPool<S> {
        &self.pool
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
                Err(err) => {
                    contained_failure("multiple metaheuristic worker", self.core.id(), &err)
                }
            }
        }
    }
}

impl<S: Solution> MetaHeuristic<S> for GenericMultipleMetaheuristic<S> {
    fn name(&self) -> &'static str {
        "GenericMultipleMetaheuristic"
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
        self.change_solution.reset();

        let states: Vec<Vec<Box<dyn MetaHeuristic<S>>>> = (0..self.workers)
            .map(|_| self.stages.iter().map(|stage| stage.box_clone()).collect())
            .collect();
        let handler = |worker: usize,
                       stages: &mut Vec<Box<dyn MetaHeuristic<S>>>,
                       job: StageJob<S>| {
            let (stage, current) = job;
            stages[stage].run_operation(current, &ctx.on_thread(base + 1 + worker))
        };

        let body = |workers: &mut WorkerPool<StageJob<S>, Result<S>>| -> Result<()> {
            let mut lineages = vec![solution.clone(); self.workers];
            let stage_count = self.stages.len();
            'rounds: loop {
                for stage in 0..stage_count {
                    let best_eval = self
                        .pool
                        .best(evaluator.as_ref())
                        .map(|best| evaluator.evaluate(&best))
                        .unwrap_or_else(|| evaluator.evaluate(&solution));
                    self.core.log_best(&best_eval);
                    if ctx.should_stop_on(slice::from_ref(&best_eval)) {
                        break 'rounds;
                    }
                    if stage == 0 {
                        stop.increment_counter();
                    }

                    let change = self.change_solution.stop();
                    if change {
                        self.change_solution.reset();
                    }
                    self.change_solution.increment_counter();

                    for worker in workers.idle_workers() {
                        if change {
                            if let Some(member) = self.pool.random_member(&random) {
                                lineages[worker] = member;
                            }
                        }
                        workers.submit(worker, (stage, lineages[worker].clone()))?;
                    }

                    let results = if self.repeatable {
                        workers.wait_all()?
                    } else {
                        workers.wait_any()?
                    };
                    self.merge(&mut lineages, results);
                }
            }
            let remaining = workers.wait_all()?;
            self.merge(&mut lineages, remaining);
            Ok(())
        };
        let (outcome, states) = ctx.threads().run_workers(states, handler, body);

        if let Some(first) = states.into_iter().next() {
            self.stages = first;
        }
        outcome?;

        Ok(self.pool.best(evaluator.as_ref()).unwrap_or(solution))
    }

    fn box_clone(&self) -> Box<dyn MetaHeuristic<S>> {
        Box::new(Self {
            core: self.core.fork(),
            stages: self.stages.iter().map(|stage| stage.box_clone()).collect(),
            pool: self.pool.deep_copy(),
            workers: self.workers,
            repeatable: self.repeatable,
            change_solution: self.change_solution.box_clone(),
        })
    }

    fn children(&self) -> Vec<&dyn MetaHeuristic<S>> {
        self.stages.iter().map(|stage| stage.as_ref()).collect()
    }
}

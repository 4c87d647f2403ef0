use std::sync::Arc;
use std::time::Instant;

use metaforge_core::{
    CrossOver, Evaluation, Evaluator, MetaforgeError, Result, Selection, Solution, ThreadRandom,
};
use tracing::debug;

use super::{contained_failure, HeuristicCore, MetaHeuristic};
use crate::context::SearchContext;
use crate::stop::StopCriteria;
use crate::telemetry::{EfficiencyReport, Telemetry, TelemetryKind};

/// Picks the best of `size` uniformly drawn members.
///
/// Larger tournaments raise the selection pressure; a size of one is
/// uniform selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentSelection {
    size: usize,
}

impl TournamentSelection {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(MetaforgeError::Configuration(
                "tournament size must be positive".to_string(),
            ));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self { size: 3 }
    }
}

impl<S> Selection<S> for TournamentSelection {
    fn name(&self) -> &'static str {
        "TournamentSelection"
    }

    fn select(
        &mut self,
        population: &[S],
        evaluations: &[Evaluation],
        random: &ThreadRandom<'_>,
    ) -> Result<usize> {
        let len = population.len().min(evaluations.len());
        let mut winner = random.next_in_range(0..len);
        for _ in 1..self.size {
            let challenger = random.next_in_range(0..len);
            if evaluations[challenger].better_than(&evaluations[winner]) {
                winner = challenger;
            }
        }
        Ok(winner)
    }

    fn box_clone(&self) -> Box<dyn Selection<S>> {
        Box::new(*self)
    }
}

/// Uniform parent selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelection;

impl<S> Selection<S> for RandomSelection {
    fn name(&self) -> &'static str {
        "RandomSelection"
    }

    fn select(
        &mut self,
        population: &[S],
        _evaluations: &[Evaluation],
        random: &ThreadRandom<'_>,
    ) -> Result<usize> {
        Ok(random.next_in_range(0..population.len()))
    }

    fn box_clone(&self) -> Box<dyn Selection<S>> {
        Box::new(*self)
    }
}

/// Index of the best evaluation; the first wins ties.
fn leader_index(evaluations: &[Evaluation]) -> usize {
    (1..evaluations.len()).fold(0, |leader, i| {
        if evaluations[i].better_than(&evaluations[leader]) {
            i
        } else {
            leader
        }
    })
}

/// Generational genetic algorithm.
///
/// Each member of the initial population goes through `construction`.
/// Every generation is evaluated, then replaced by a same-size offspring
/// generation: two parents chosen by `selection`, combined by
/// `crossover`, then passed through `mutation`. The best solution seen in
/// any generation is returned.
#[derive(Debug)]
pub struct GeneticAlgorithm<S: Solution> {
    core: HeuristicCore<S>,
    construction: Box<dyn MetaHeuristic<S>>,
    mutation: Box<dyn MetaHeuristic<S>>,
    selection: Box<dyn Selection<S>>,
    crossover: Box<dyn CrossOver<S>>,
    crossover_telemetry: Telemetry,
    population_size: usize,
}

impl<S: Solution> GeneticAlgorithm<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stop: Box<dyn StopCriteria>,
        evaluator: Arc<dyn Evaluator<S>>,
        construction: Box<dyn MetaHeuristic<S>>,
        mutation: Box<dyn MetaHeuristic<S>>,
        selection: Box<dyn Selection<S>>,
        crossover: Box<dyn CrossOver<S>>,
        population_size: usize,
    ) -> Result<Self> {
        if population_size == 0 {
            return Err(MetaforgeError::Configuration(
                "population size must be positive".to_string(),
            ));
        }
        Ok(Self {
            core: HeuristicCore::new(stop, evaluator),
            construction,
            mutation,
            selection,
            crossover,
            crossover_telemetry: Telemetry::default(),
            population_size,
        })
    }

    pub fn with_crossover_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.crossover_telemetry = telemetry;
        self
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// Evolves `population` below `parent` and returns the best member seen.
    pub fn evolve(&mut self, population: Vec<S>, parent: &SearchContext<'_>) -> Result<S> {
        let stop = Arc::clone(self.core.stop_criteria());
        stop.reset();
        let ctx = parent.child(stop.as_ref());
        self.evolve_in(population, &ctx)
    }

    fn evolve_in(&mut self, population: Vec<S>, ctx: &SearchContext<'_>) -> Result<S> {
        if population.is_empty() {
            return Err(MetaforgeError::Configuration(
                "genetic algorithm needs a non-empty population".to_string(),
            ));
        }
        let random = ctx.random();
        let evaluator = Arc::clone(self.core.evaluator());
        let stop = Arc::clone(self.core.stop_criteria());

        let mut current: Vec<S> = Vec::with_capacity(population.len());
        for member in population {
            match self.construction.run_operation(member.clone(), ctx) {
                Ok(constructed) => current.push(constructed),
                Err(err) => {
                    contained_failure(self.construction.name(), self.construction.id(), &err);
                    current.push(member);
                }
            }
        }
        let len = current.len();

        let mut best: Option<(S, Evaluation)> = None;
        loop {
            if ctx.should_stop() {
                break;
            }
            stop.increment_counter();

            let evaluations: Vec<Evaluation> =
                current.iter().map(|member| evaluator.evaluate(member)).collect();
            let leader = leader_index(&evaluations);
            if best
                .as_ref()
                .map_or(true, |(_, eval)| evaluations[leader].better_than(eval))
            {
                debug!(
                    event = "best_improved",
                    metaheuristic = self.name(),
                    id = %self.core.id(),
                    objective = evaluations[leader].objective(),
                );
                best = Some((current[leader].clone(), evaluations[leader].clone()));
            }
            if let Some((_, eval)) = &best {
                self.core.log_best(eval);
            }

            let mut tracked = evaluations.clone();
            tracked.swap(0, leader);
            if ctx.should_stop_on(&tracked) {
                break;
            }

            let mut next = Vec::with_capacity(len);
            while next.len() < len {
                let child = match self.breed(&current, &evaluations, &random) {
                    Ok(child) => child,
                    Err(err) => {
                        contained_failure(self.crossover.name(), self.core.id(), &err);
                        current[next.len() % len].clone()
                    }
                };
                let mutated = match self.mutation.run_operation(child.clone(), ctx) {
                    Ok(mutated) => mutated,
                    Err(err) => {
                        contained_failure(self.mutation.name(), self.mutation.id(), &err);
                        child
                    }
                };
                self.core.log_current(&evaluator.evaluate(&mutated));
                next.push(mutated);
            }
            current = next;
        }

        if let Some((solution, _)) = best {
            return Ok(solution);
        }
        // Stopped before the first generation was evaluated.
        let evaluations: Vec<Evaluation> =
            current.iter().map(|member| evaluator.evaluate(member)).collect();
        let leader = leader_index(&evaluations);
        Ok(current.swap_remove(leader))
    }

    fn breed(
        &mut self,
        population: &[S],
        evaluations: &[Evaluation],
        random: &ThreadRandom<'_>,
    ) -> Result<S> {
        let first = self.selection.select(population, evaluations, random)?;
        let second = self.selection.select(population, evaluations, random)?;
        let (Some(a), Some(b)) = (population.get(first), population.get(second)) else {
            return Err(MetaforgeError::Configuration(format!(
                "{} picked index {} from a population of {}",
                self.selection.name(),
                first.max(second),
                population.len()
            )));
        };

        let name = self.crossover.name();
        let id = self.core.id();
        self.crossover_telemetry
            .notify(name, id, TelemetryKind::ApplyStart, Some(name), &[]);
        let started = Instant::now();
        let result = self.crossover.cross(a, b, random);
        self.crossover_telemetry
            .report_mut()
            .record_apply(result.is_ok(), started.elapsed());
        let child = match result {
            Ok(child) => child,
            Err(err) => {
                self.crossover_telemetry
                    .notify(name, id, TelemetryKind::ApplyFailed, Some(name), &[]);
                return Err(err);
            }
        };
        self.crossover_telemetry
            .notify(name, id, TelemetryKind::ApplyEnd, Some(name), &[]);

        let parent_best = if evaluations[first].better_than(&evaluations[second]) {
            &evaluations[first]
        } else {
            &evaluations[second]
        };
        let child_eval = self.core.evaluate(&child);
        if child_eval.better_than(parent_best) {
            self.crossover_telemetry
                .report_mut()
                .record_accept(parent_best.objective() - child_eval.objective());
        }
        Ok(child)
    }
}

impl<S: Solution> MetaHeuristic<S> for GeneticAlgorithm<S> {
    fn name(&self) -> &'static str {
        "GeneticAlgorithm"
    }

    fn core(&self) -> &HeuristicCore<S> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut HeuristicCore<S> {
        &mut self.core
    }

    fn run(&mut self, solution: S, ctx: &SearchContext<'_>) -> Result<S> {
        let population = vec![solution; self.population_size];
        self.evolve_in(population, ctx)
    }

    fn box_clone(&self) -> Box<dyn MetaHeuristic<S>> {
        Box::new(Self {
            core: self.core.fork(),
            construction: self.construction.box_clone(),
            mutation: self.mutation.box_clone(),
            selection: self.selection.box_clone(),
            crossover: self.crossover.box_clone(),
            crossover_telemetry: self.crossover_telemetry.fresh(),
            population_size: self.population_size,
        })
    }

    fn children(&self) -> Vec<&dyn MetaHeuristic<S>> {
        vec![self.construction.as_ref(), self.mutation.as_ref()]
    }

    fn operator_reports(&self) -> Vec<(&'static str, EfficiencyReport)> {
        vec![(
            self.crossover.name(),
            self.crossover_telemetry.report().clone(),
        )]
    }
}

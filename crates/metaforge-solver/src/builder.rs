//! Builder module for constructing search components from configuration
//!
//! This module wires `metaforge_config` types to the components of this
//! crate. Every builder validates through the component constructors, so
//! a bad setting surfaces as [`MetaforgeError::Configuration`].

use std::time::Duration;

use metaforge_config::{
    AcceptanceConfig, ConfigError, PoolConfig, SearchConfig, SelectionConfig,
    SelectionStrategyConfig, StopConfig,
};
use metaforge_core::{MetaforgeError, Neighborhood, Result, Solution, ThreadManager};

use crate::acceptance::{
    AcceptanceCriteria, Better, BetterOrSame, BetterUnknownAcceptance, KnownSolutionRate,
    SimulatedAnnealing, Threshold,
};
use crate::heuristic::{NeighborhoodSelection, SelectionStrategy, TrackedNeighborhood};
use crate::memory::SolutionMemory;
use crate::pool::{EliteDiversePool, ElitePool, ListPool, Pool};
use crate::stop::{StopCriteria, StopNoImprovement, StopTimeIteration};

fn invalid(err: ConfigError) -> MetaforgeError {
    MetaforgeError::Configuration(err.to_string())
}

/// Builder for constructing acceptance criteria from configuration.
pub struct AcceptanceBuilder;

impl AcceptanceBuilder {
    /// Builds an acceptance criteria with a fresh seen-solution memory.
    pub fn build<S: Solution>(config: &AcceptanceConfig) -> Result<Box<dyn AcceptanceCriteria<S>>> {
        Self::build_with_memory(config, &SolutionMemory::new())
    }

    /// Builds an acceptance criteria; `better_unknown` shares `memory`.
    pub fn build_with_memory<S: Solution>(
        config: &AcceptanceConfig,
        memory: &SolutionMemory,
    ) -> Result<Box<dyn AcceptanceCriteria<S>>> {
        Ok(match config {
            AcceptanceConfig::Better => Box::new(Better::new()),
            AcceptanceConfig::BetterOrSame => Box::new(BetterOrSame::new()),
            AcceptanceConfig::Threshold(schedule) => Box::new(Threshold::new(
                schedule.t_start,
                schedule.t_end,
                schedule.iter_max,
            )?),
            AcceptanceConfig::SimulatedAnnealing(schedule) => Box::new(SimulatedAnnealing::new(
                schedule.t_start,
                schedule.t_end,
                schedule.iter_max,
            )?),
            AcceptanceConfig::BetterUnknown(rate) => {
                let rate = match (rate.fixed_percent, rate.log_factor) {
                    (Some(percent), None) => KnownSolutionRate::Fixed(percent),
                    (None, Some(factor)) => KnownSolutionRate::Decaying(factor),
                    _ => {
                        return Err(invalid(ConfigError::Invalid(
                            "better_unknown needs exactly one of fixed_percent and log_factor"
                                .to_string(),
                        )))
                    }
                };
                Box::new(BetterUnknownAcceptance::new(rate, memory.clone())?)
            }
        })
    }
}

/// Builder for constructing stop criteria from configuration.
pub struct StopBuilder;

impl StopBuilder {
    pub fn build(config: &StopConfig) -> Result<Box<dyn StopCriteria>> {
        Ok(match config {
            StopConfig::TimeIteration(limits) => Box::new(Self::time_iteration(
                limits.time_limit_ms,
                limits.max_iterations,
                limits.progress_step,
            )?),
            StopConfig::NoImprovement(plateau) => {
                let inner = Self::time_iteration(
                    plateau.time_limit_ms,
                    plateau.max_iterations,
                    plateau.progress_step,
                )?;
                let stop = match plateau.tolerance {
                    Some(tolerance) => {
                        StopNoImprovement::new(inner, plateau.iterations_no_improv, tolerance)?
                    }
                    None => StopNoImprovement::with_window(inner, plateau.iterations_no_improv)?,
                };
                Box::new(stop)
            }
        })
    }

    fn time_iteration(
        time_limit_ms: Option<u64>,
        max_iterations: Option<u64>,
        progress_step: Option<f64>,
    ) -> Result<StopTimeIteration> {
        let stop = StopTimeIteration::new(time_limit_ms.map(Duration::from_millis), max_iterations);
        match progress_step {
            Some(step) => stop.with_progress_step(step),
            None => Ok(stop),
        }
    }
}

/// Builder for constructing solution pools from configuration.
pub struct PoolBuilder;

impl PoolBuilder {
    pub fn build<S: Solution>(config: &PoolConfig) -> Result<Box<dyn Pool<S>>> {
        Ok(match config {
            PoolConfig::List => Box::new(ListPool::new()),
            PoolConfig::Elite(elite) => Box::new(ElitePool::new(elite.limit)?),
            PoolConfig::EliteDiverse(diverse) => Box::new(EliteDiversePool::new(
                diverse.limit,
                diverse.diversity_weight,
            )?),
        })
    }
}

/// Builder for neighborhood selections.
pub struct SelectionBuilder;

impl SelectionBuilder {
    /// Wraps `neighborhoods` in a selection; weights follow insertion order.
    pub fn build<S: Solution>(
        config: &SelectionConfig,
        neighborhoods: Vec<Box<dyn Neighborhood<S>>>,
    ) -> Result<NeighborhoodSelection<S>> {
        let strategy = match config.strategy {
            SelectionStrategyConfig::List => SelectionStrategy::List,
            SelectionStrategyConfig::Random => SelectionStrategy::Random,
            SelectionStrategyConfig::Probability => SelectionStrategy::Probability,
        };
        let mut selection = NeighborhoodSelection::new(strategy, config.circular);
        for (index, neighborhood) in neighborhoods.into_iter().enumerate() {
            selection.push(TrackedNeighborhood::from_boxed(neighborhood), config.weight(index))?;
        }
        Ok(selection)
    }
}

/// Construction of a [`ThreadManager`] from the thread settings of a
/// [`SearchConfig`].
pub trait ThreadsFromConfig: Sized {
    fn from_config(config: &SearchConfig) -> Result<Self>;
}

impl ThreadsFromConfig for ThreadManager {
    fn from_config(config: &SearchConfig) -> Result<Self> {
        config.validate().map_err(invalid)?;
        ThreadManager::new(config.thread_count.resolve(), config.random_seed)
    }
}

#[cfg(test)]
mod tests {
    use metaforge_config::{
        BetterUnknownConfig, EliteConfig, EliteDiverseConfig, NoImprovementConfig,
        ScheduleConfig, ThreadCount, TimeIterationConfig,
    };
    use metaforge_test::{sum_evaluator, ScriptedNeighborhood, ShiftNeighborhood, VectorSolution};

    use super::*;

    #[test]
    fn test_acceptance_builder_covers_every_variant() {
        let configs = [
            AcceptanceConfig::Better,
            AcceptanceConfig::BetterOrSame,
            AcceptanceConfig::Threshold(ScheduleConfig {
                t_start: 0.1,
                t_end: 0.0,
                iter_max: 10,
            }),
            AcceptanceConfig::SimulatedAnnealing(ScheduleConfig {
                t_start: 5.0,
                t_end: 0.5,
                iter_max: 10,
            }),
            AcceptanceConfig::BetterUnknown(BetterUnknownConfig {
                fixed_percent: Some(0.3),
                log_factor: None,
            }),
        ];
        for config in &configs {
            assert!(AcceptanceBuilder::build::<VectorSolution>(config).is_ok());
        }
    }

    #[test]
    fn test_acceptance_builder_rejects_bad_schedule() {
        let config = AcceptanceConfig::SimulatedAnnealing(ScheduleConfig {
            t_start: 1.0,
            t_end: 2.0,
            iter_max: 10,
        });
        let err = AcceptanceBuilder::build::<VectorSolution>(&config).unwrap_err();
        assert!(matches!(err, MetaforgeError::Configuration(_)));
    }

    #[test]
    fn test_better_unknown_needs_exactly_one_rate() {
        let both = AcceptanceConfig::BetterUnknown(BetterUnknownConfig {
            fixed_percent: Some(0.1),
            log_factor: Some(0.1),
        });
        let neither = AcceptanceConfig::BetterUnknown(BetterUnknownConfig::default());
        assert!(AcceptanceBuilder::build::<VectorSolution>(&both).is_err());
        assert!(AcceptanceBuilder::build::<VectorSolution>(&neither).is_err());
    }

    #[test]
    fn test_stop_builder_time_iteration() {
        let stop = StopBuilder::build(&StopConfig::TimeIteration(TimeIterationConfig {
            time_limit_ms: None,
            max_iterations: Some(2),
            progress_step: Some(0.5),
        }))
        .unwrap();
        for _ in 0..2 {
            stop.increment_counter();
        }
        assert!(!stop.stop());
        stop.increment_counter();
        assert!(stop.stop());
    }

    #[test]
    fn test_stop_builder_rejects_zero_window() {
        let config = StopConfig::NoImprovement(NoImprovementConfig {
            time_limit_ms: None,
            max_iterations: None,
            progress_step: None,
            iterations_no_improv: 0,
            tolerance: None,
        });
        assert!(StopBuilder::build(&config).is_err());
    }

    #[test]
    fn test_pool_builder() {
        let evaluator = sum_evaluator();
        let mut elite =
            PoolBuilder::build::<VectorSolution>(&PoolConfig::Elite(EliteConfig { limit: 1 }))
                .unwrap();
        elite.add(VectorSolution::new(vec![3]), &evaluator);
        elite.add(VectorSolution::new(vec![1]), &evaluator);
        assert_eq!(elite.solutions(), &[VectorSolution::new(vec![1])]);

        assert!(PoolBuilder::build::<VectorSolution>(&PoolConfig::Elite(EliteConfig {
            limit: 0
        }))
        .is_err());
        assert!(
            PoolBuilder::build::<VectorSolution>(&PoolConfig::EliteDiverse(EliteDiverseConfig {
                limit: 3,
                diversity_weight: 0.5,
            }))
            .is_ok()
        );
    }

    #[test]
    fn test_selection_builder_applies_weights() {
        let config = SelectionConfig {
            strategy: SelectionStrategyConfig::Probability,
            circular: true,
            weights: vec![2.0, -1.0],
        };
        let neighborhoods: Vec<Box<dyn Neighborhood<VectorSolution>>> = vec![
            Box::new(ShiftNeighborhood::new()),
            Box::new(ScriptedNeighborhood::new(0, vec![1])),
        ];
        assert!(SelectionBuilder::build(&config, neighborhoods).is_err());

        let config = SelectionConfig {
            weights: vec![2.0],
            ..config
        };
        let neighborhoods: Vec<Box<dyn Neighborhood<VectorSolution>>> = vec![
            Box::new(ShiftNeighborhood::new()),
            Box::new(ScriptedNeighborhood::new(0, vec![1])),
        ];
        let selection = SelectionBuilder::build(&config, neighborhoods).unwrap();
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.strategy(), SelectionStrategy::Probability);
        assert!(selection.is_circular());
    }

    #[test]
    fn test_threads_from_config() {
        let config = SearchConfig::new()
            .with_thread_count(ThreadCount::Specific(3))
            .with_random_seed(9);
        let threads = ThreadManager::from_config(&config).unwrap();
        assert_eq!(threads.thread_count(), 3);
        assert_eq!(threads.seed(), Some(9));

        let zero = SearchConfig::new().with_thread_count(ThreadCount::Specific(0));
        assert!(matches!(
            ThreadManager::from_config(&zero),
            Err(MetaforgeError::Configuration(_))
        ));
    }
}

//! MetaForge - composable metaheuristic search in Rust
//!
//! A problem plugs in through [`Solution`], an [`Evaluator`] and one or
//! more [`Neighborhood`]s; the search algorithms are assembled from the
//! building blocks re-exported here.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use metaforge::prelude::*;
//! use metaforge_test::{distance_evaluator, ShiftNeighborhood, VectorSolution};
//!
//! let threads = ThreadManager::single(Some(42));
//! let root = SearchContext::root(&threads);
//! let mut search = BestImprovement::new(
//!     Box::new(StopTimeIteration::iterations(1_000)),
//!     Arc::new(distance_evaluator(0)),
//!     NeighborhoodSelection::list(true).with(ShiftNeighborhood::new()),
//!     Box::new(Better::new()),
//! );
//!
//! let best = search
//!     .run_operation(VectorSolution::new(vec![3, -2]), &root)
//!     .unwrap();
//! assert_eq!(best.values, vec![0, 0]);
//! ```

// Problem contracts
pub use metaforge_core::{
    verify_incremental, BoxedMovement, Constraint, ConstraintEvaluation, ConstraintEvaluator,
    ConstraintKind, CrossOver, EntityId, Evaluation, Evaluator, FanOut, MetaforgeError, Movement,
    Neighborhood, Result, Selection, Solution, ThreadManager, ThreadRandom, WorkerPool,
};

// Search engine
pub use metaforge_solver::{
    acceptance, builder, context, heuristic, memory, metaheuristic, pool, stop, telemetry,
};

// Configuration
pub use metaforge_config::{ConfigError, SearchConfig};

#[cfg(feature = "console")]
pub mod console;

pub mod prelude {
    pub use metaforge_core::{
        ConstraintEvaluator, CrossOver, Evaluation, Evaluator, MetaforgeError, Movement,
        Neighborhood, Result, Selection, Solution, ThreadManager, ThreadRandom,
    };
    pub use metaforge_solver::acceptance::{
        AcceptanceCriteria, Better, BetterOrSame, BetterUnknownAcceptance, SimulatedAnnealing,
        Threshold,
    };
    pub use metaforge_solver::builder::{
        AcceptanceBuilder, PoolBuilder, SelectionBuilder, StopBuilder, ThreadsFromConfig,
    };
    pub use metaforge_solver::context::SearchContext;
    pub use metaforge_solver::heuristic::{CompositeMovement, NeighborhoodSelection};
    pub use metaforge_solver::memory::SolutionMemory;
    pub use metaforge_solver::metaheuristic::{
        BestImprovement, FirstImprovement, GenericMultipleMetaheuristic, GeneticAlgorithm, Grasp,
        Grc, Ils, MetaHeuristic, ParallelIls, Pertubation, RandomSelection, TournamentSelection,
    };
    pub use metaforge_solver::pool::{EliteDiversePool, ElitePool, ListPool, Pool, SharedPool};
    pub use metaforge_solver::stop::{StopCriteria, StopNoImprovement, StopTimeIteration};
    pub use metaforge_config::SearchConfig;
}

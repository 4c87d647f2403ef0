//! MetaForge search engine
//!
//! This crate provides the search machinery on top of `metaforge-core`:
//! - Search context and stop criteria chains
//! - Tracked neighborhoods, neighborhood selections and composite movements
//! - Acceptance criteria
//! - Solution pools and the shared seen-solution memory
//! - Metaheuristics (local search, GRC, GRASP, ILS, parallel variants, genetic algorithm)
//! - Efficiency telemetry
//! - Configuration wiring (builder module)

pub mod acceptance;
pub mod builder;
pub mod context;
pub mod heuristic;
pub mod memory;
pub mod metaheuristic;
pub mod pool;
pub mod stop;
pub mod telemetry;

pub use acceptance::{
    AcceptanceCriteria, Better, BetterOrSame, BetterUnknownAcceptance, KnownSolutionRate,
    SimulatedAnnealing, Threshold,
};
pub use builder::{AcceptanceBuilder, PoolBuilder, SelectionBuilder, StopBuilder, ThreadsFromConfig};
pub use context::SearchContext;
pub use heuristic::{
    AppliedMove, CompositeMovement, NeighborhoodSelection, PendingMove, SelectionStrategy,
    TrackedNeighborhood,
};
pub use memory::SolutionMemory;
pub use metaheuristic::{
    BestImprovement, FirstImprovement, GenericMultipleMetaheuristic, GeneticAlgorithm, Grasp, Grc,
    HeuristicCore, Ils, MetaHeuristic, ParallelIls, Pertubation, RandomSelection, SearchReport,
    SolutionReport, TournamentSelection, TrajectoryPoint,
};
pub use pool::{AddAction, EliteDiversePool, ElitePool, ListPool, Pool, PoolStats, SharedPool};
pub use stop::{StopCriteria, StopNoImprovement, StopTimeIteration};
pub use telemetry::{
    CountingSink, EfficiencyReport, Telemetry, TelemetryEvent, TelemetryKind, TelemetrySink,
    TracingSink,
};

//! Shared test fixtures for MetaForge crates.
//!
//! This crate depends on `metaforge-core` only, so the solver crate can use
//! it as a dev-dependency without a cycle.
//!
//! - [`vector`] - integer-vector solution, evaluators and constraints
//! - [`moves`] - shift movements, scripted and generated neighborhoods
//! - [`genetic`] - crossover for vector solutions
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! metaforge-test = { workspace = true }
//! ```

pub mod genetic;
pub mod moves;
pub mod vector;

pub use genetic::UniformCrossOver;
pub use moves::{
    FailingNeighborhood, LogEntry, MoveLog, RandomKickNeighborhood, ScriptedNeighborhood,
    ShiftMove, ShiftNeighborhood,
};
pub use vector::{distance_evaluator, sum_evaluator, UpperBound, VectorSolution};

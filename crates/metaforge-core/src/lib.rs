//! MetaForge Core - Core types and traits for metaheuristic search
//!
//! This crate provides the contracts every problem plugs into:
//! - [`Solution`] for candidate representations
//! - [`Evaluation`], [`Constraint`] and [`Evaluator`] for quality and feasibility
//! - [`Movement`] and [`Neighborhood`] for local transformations
//! - [`Selection`] and [`CrossOver`] for genetic operators
//! - [`ThreadManager`] for per-thread random streams and worker fan-out

pub mod constraint;
pub mod entity;
pub mod error;
pub mod evaluation;
pub mod evaluator;
pub mod movement;
pub mod neighborhood;
pub mod operator;
pub mod solution;
pub mod threads;

pub use constraint::Constraint;
pub use entity::EntityId;
pub use error::{MetaforgeError, Result};
pub use evaluation::{ConstraintEvaluation, ConstraintKind, Evaluation};
pub use evaluator::{verify_incremental, ConstraintEvaluator, Evaluator};
pub use movement::Movement;
pub use neighborhood::{BoxedMovement, Neighborhood};
pub use operator::{CrossOver, Selection};
pub use solution::Solution;
pub use threads::{FanOut, ThreadManager, ThreadRandom, WorkerPool};

//! Constraint contract.

use std::fmt::Debug;

use crate::evaluation::{ConstraintEvaluation, ConstraintKind};

/// A single feasibility/penalty check over a solution.
pub trait Constraint<S>: Send + Sync + Debug {
    /// The kind reported in every evaluation of this constraint.
    fn kind(&self) -> &ConstraintKind;

    /// Checks the constraint against `solution`.
    fn evaluate(&self, solution: &S) -> ConstraintEvaluation;
}

//! Solution evaluators.

use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::constraint::Constraint;
use crate::error::{MetaforgeError, Result};
use crate::evaluation::Evaluation;

/// Produces an [`Evaluation`] for a solution.
///
/// Evaluators are shared by every thread of a search, hence `Sync`. The
/// two hooks allow an incremental evaluator to keep a cache in step with
/// the apply/unapply cycle of movements. They default to no-ops, which
/// means every `evaluate` call is a full recomputation.
pub trait Evaluator<S>: Send + Sync + Debug {
    /// Evaluates `solution`.
    fn evaluate(&self, solution: &S) -> Evaluation;

    /// Called before a batch of movements is tried on `solution`.
    fn save_evaluation_state(&self, _solution: &S) {}

    /// Called after a movement has been unapplied from `solution`.
    fn update_evaluation_after_unapply(&self, _solution: &S) {}
}

type ObjectiveFn<S> = dyn Fn(&S) -> f64 + Send + Sync;

/// Evaluator composed of an objective function and an ordered list of constraints.
///
/// With `stop_on_first_infeasibility` set, constraint checking stops at
/// the first infeasible result. The evaluation is then still infeasible,
/// but carries fewer penalties.
///
/// # Example
///
/// ```
/// use metaforge_core::{ConstraintEvaluator, Evaluator};
///
/// let evaluator = ConstraintEvaluator::new(|values: &Vec<i64>| {
///     values.iter().sum::<i64>() as f64
/// });
/// assert_eq!(evaluator.evaluate(&vec![1, 2, 3]).objective(), 6.0);
/// ```
pub struct ConstraintEvaluator<S> {
    objective: Arc<ObjectiveFn<S>>,
    constraints: Vec<Box<dyn Constraint<S>>>,
    stop_on_first_infeasibility: bool,
}

impl<S> ConstraintEvaluator<S> {
    /// Creates an evaluator around a base objective function.
    pub fn new<F>(objective: F) -> Self
    where
        F: Fn(&S) -> f64 + Send + Sync + 'static,
    {
        Self {
            objective: Arc::new(objective),
            constraints: Vec::new(),
            stop_on_first_infeasibility: false,
        }
    }

    /// Appends a constraint; constraints are checked in insertion order.
    pub fn with_constraint(mut self, constraint: impl Constraint<S> + 'static) -> Self {
        self.constraints.push(Box::new(constraint));
        self
    }

    /// Stops checking constraints at the first infeasible one.
    pub fn with_stop_on_first_infeasibility(mut self, stop: bool) -> Self {
        self.stop_on_first_infeasibility = stop;
        self
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

impl<S> Evaluator<S> for ConstraintEvaluator<S> {
    fn evaluate(&self, solution: &S) -> Evaluation {
        let mut results = Vec::with_capacity(self.constraints.len());
        for constraint in &self.constraints {
            let result = constraint.evaluate(solution);
            let infeasible = result.is_infeasible();
            results.push(result);
            if infeasible && self.stop_on_first_infeasibility {
                break;
            }
        }
        Evaluation::new((self.objective)(solution), results)
    }
}

impl<S> Debug for ConstraintEvaluator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintEvaluator")
            .field("constraints", &self.constraints)
            .field(
                "stop_on_first_infeasibility",
                &self.stop_on_first_infeasibility,
            )
            .finish()
    }
}

/// Checks an incrementally maintained evaluation against a full recomputation.
///
/// Intended for invariant tests of incremental evaluators; the engine does
/// not call it during search.
pub fn verify_incremental<S>(
    evaluator: &dyn Evaluator<S>,
    solution: &S,
    incremental: &Evaluation,
    tolerance: f64,
) -> Result<()> {
    let full = evaluator.evaluate(solution);
    let consistent = (full.objective() - incremental.objective()).abs() <= tolerance
        && full.is_infeasible() == incremental.is_infeasible();
    if consistent {
        Ok(())
    } else {
        Err(MetaforgeError::EvaluationInconsistency {
            expected: full.objective(),
            actual: incremental.objective(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{ConstraintEvaluation, ConstraintKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct MaxValue {
        kind: ConstraintKind,
        max: i64,
        calls: Arc<AtomicUsize>,
    }

    impl Constraint<Vec<i64>> for MaxValue {
        fn kind(&self) -> &ConstraintKind {
            &self.kind
        }

        fn evaluate(&self, solution: &Vec<i64>) -> ConstraintEvaluation {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let excess: i64 = solution.iter().map(|v| (v - self.max).max(0)).sum();
            ConstraintEvaluation::new(self.kind.clone(), excess > 0, excess as f64)
        }
    }

    fn max_value(name: &str, max: i64, calls: &Arc<AtomicUsize>) -> MaxValue {
        MaxValue {
            kind: ConstraintKind::new(name),
            max,
            calls: Arc::clone(calls),
        }
    }

    fn sum(values: &Vec<i64>) -> f64 {
        values.iter().sum::<i64>() as f64
    }

    #[test]
    fn test_constraints_add_penalties() {
        let calls = Arc::new(AtomicUsize::new(0));
        let evaluator: ConstraintEvaluator<Vec<i64>> =
            ConstraintEvaluator::new(sum).with_constraint(max_value("max", 5, &calls));

        let eval = evaluator.evaluate(&vec![7, 1]);
        assert_eq!(eval.objective(), 10.0);
        assert!(eval.is_infeasible());
    }

    #[test]
    fn test_all_constraints_checked_by_default() {
        let calls = Arc::new(AtomicUsize::new(0));
        let evaluator = ConstraintEvaluator::new(sum)
            .with_constraint(max_value("first", 0, &calls))
            .with_constraint(max_value("second", 0, &calls));

        let eval = evaluator.evaluate(&vec![3]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(eval.constraints().len(), 2);
    }

    #[test]
    fn test_stop_on_first_infeasibility() {
        let calls = Arc::new(AtomicUsize::new(0));
        let evaluator = ConstraintEvaluator::new(sum)
            .with_constraint(max_value("first", 0, &calls))
            .with_constraint(max_value("second", 0, &calls))
            .with_stop_on_first_infeasibility(true);

        let eval = evaluator.evaluate(&vec![3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(eval.is_infeasible());
        assert_eq!(eval.constraints().len(), 1);
    }

    #[test]
    fn test_verify_incremental() {
        let evaluator: ConstraintEvaluator<Vec<i64>> = ConstraintEvaluator::new(sum);
        let solution = vec![1, 2];
        assert!(
            verify_incremental(&evaluator, &solution, &Evaluation::from_objective(3.0), 1e-9)
                .is_ok()
        );

        let err =
            verify_incremental(&evaluator, &solution, &Evaluation::from_objective(4.0), 1e-9)
                .unwrap_err();
        assert_eq!(
            err,
            MetaforgeError::EvaluationInconsistency {
                expected: 3.0,
                actual: 4.0
            }
        );
    }
}

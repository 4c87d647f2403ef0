//! Constraint evaluations and the aggregate solution evaluation.
//!
//! An [`Evaluation`] is immutable once built. It caches the derived values
//! (`objective`, `infeasible`) so comparisons in hot search loops never
//! re-sum the constraint list.

use std::fmt;
use std::sync::Arc;

/// Identifier of a kind of constraint, e.g. `"capacity"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintKind(Arc<str>);

impl ConstraintKind {
    /// Creates a constraint kind from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        ConstraintKind(Arc::from(name.as_ref()))
    }

    /// Returns the name of this kind.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConstraintKind {
    fn from(name: &str) -> Self {
        ConstraintKind::new(name)
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of checking one constraint against a solution.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintEvaluation {
    kind: ConstraintKind,
    infeasible: bool,
    penalty: f64,
}

impl ConstraintEvaluation {
    /// Creates a constraint evaluation.
    pub fn new(kind: ConstraintKind, infeasible: bool, penalty: f64) -> Self {
        Self {
            kind,
            infeasible,
            penalty,
        }
    }

    /// A satisfied constraint contributing `penalty` to the objective.
    pub fn feasible(kind: ConstraintKind, penalty: f64) -> Self {
        Self::new(kind, false, penalty)
    }

    /// A violated constraint contributing `penalty` to the objective.
    pub fn violated(kind: ConstraintKind, penalty: f64) -> Self {
        Self::new(kind, true, penalty)
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    pub fn is_infeasible(&self) -> bool {
        self.infeasible
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }
}

/// Quality and feasibility assessment of a solution.
///
/// Infeasible evaluations are always worse than feasible ones; between two
/// evaluations of equal feasibility the lower objective wins.
///
/// # Example
///
/// ```
/// use metaforge_core::{ConstraintEvaluation, ConstraintKind, Evaluation};
///
/// let feasible = Evaluation::from_objective(100.0);
/// let infeasible = Evaluation::new(
///     1.0,
///     vec![ConstraintEvaluation::violated(ConstraintKind::new("capacity"), 0.0)],
/// );
///
/// assert!(feasible.better_than(&infeasible));
/// assert!(!infeasible.better_than(&feasible));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    base_objective: f64,
    objective: f64,
    infeasible: bool,
    constraints: Vec<ConstraintEvaluation>,
}

impl Evaluation {
    /// Builds an evaluation from a base objective and constraint results.
    pub fn new(base_objective: f64, constraints: Vec<ConstraintEvaluation>) -> Self {
        let objective = base_objective + constraints.iter().map(|c| c.penalty).sum::<f64>();
        let infeasible = constraints.iter().any(|c| c.infeasible);
        Self {
            base_objective,
            objective,
            infeasible,
            constraints,
        }
    }

    /// Builds a feasible evaluation without constraints.
    pub fn from_objective(objective: f64) -> Self {
        Self::new(objective, Vec::new())
    }

    /// Base objective plus all penalties.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn base_objective(&self) -> f64 {
        self.base_objective
    }

    /// True if any constraint is infeasible.
    pub fn is_infeasible(&self) -> bool {
        self.infeasible
    }

    pub fn constraints(&self) -> &[ConstraintEvaluation] {
        &self.constraints
    }

    /// Kinds of the constraints that are infeasible, in evaluation order.
    pub fn infeasible_kinds(&self) -> impl Iterator<Item = &ConstraintKind> {
        self.constraints
            .iter()
            .filter(|c| c.infeasible)
            .map(|c| &c.kind)
    }

    /// Returns true if `self` is strictly better than `other`.
    pub fn better_than(&self, other: &Evaluation) -> bool {
        if self.infeasible != other.infeasible {
            return !self.infeasible;
        }
        self.objective < other.objective
    }

    /// Returns true if `self` is better than or as good as `other`.
    pub fn better_or_equal_to(&self, other: &Evaluation) -> bool {
        if self.infeasible != other.infeasible {
            return !self.infeasible;
        }
        self.objective <= other.objective
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.infeasible {
            write!(f, "{} (infeasible)", self.objective)
        } else {
            write!(f, "{}", self.objective)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kind(name: &str) -> ConstraintKind {
        ConstraintKind::new(name)
    }

    #[test]
    fn test_objective_sums_penalties() {
        let eval = Evaluation::new(
            10.0,
            vec![
                ConstraintEvaluation::feasible(kind("a"), 2.5),
                ConstraintEvaluation::feasible(kind("b"), 0.5),
            ],
        );
        assert_eq!(eval.objective(), 13.0);
        assert_eq!(eval.base_objective(), 10.0);
        assert!(!eval.is_infeasible());
    }

    #[test]
    fn test_any_violation_makes_infeasible() {
        let eval = Evaluation::new(
            0.0,
            vec![
                ConstraintEvaluation::feasible(kind("a"), 0.0),
                ConstraintEvaluation::violated(kind("b"), 1.0),
            ],
        );
        assert!(eval.is_infeasible());
        let kinds: Vec<_> = eval.infeasible_kinds().map(|k| k.as_str()).collect();
        assert_eq!(kinds, vec!["b"]);
    }

    #[test]
    fn test_feasible_beats_infeasible_regardless_of_objective() {
        let feasible = Evaluation::from_objective(1_000.0);
        let infeasible =
            Evaluation::new(-1_000.0, vec![ConstraintEvaluation::violated(kind("c"), 0.0)]);
        assert!(feasible.better_than(&infeasible));
        assert!(feasible.better_or_equal_to(&infeasible));
        assert!(!infeasible.better_or_equal_to(&feasible));
    }

    #[test]
    fn test_lower_objective_wins() {
        let low = Evaluation::from_objective(1.0);
        let high = Evaluation::from_objective(2.0);
        assert!(low.better_than(&high));
        assert!(!high.better_than(&low));
        assert!(!low.better_than(&low.clone()));
        assert!(low.better_or_equal_to(&low.clone()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Evaluation::from_objective(3.0).to_string(), "3");
        let infeasible =
            Evaluation::new(3.0, vec![ConstraintEvaluation::violated(kind("c"), 0.0)]);
        assert_eq!(infeasible.to_string(), "3 (infeasible)");
    }

    fn arb_evaluation() -> impl Strategy<Value = Evaluation> {
        (-1.0e6f64..1.0e6, any::<bool>()).prop_map(|(objective, infeasible)| {
            Evaluation::new(
                objective,
                vec![ConstraintEvaluation::new(kind("k"), infeasible, 0.0)],
            )
        })
    }

    proptest! {
        #[test]
        fn test_better_than_is_antisymmetric(a in arb_evaluation(), b in arb_evaluation()) {
            prop_assert!(!(a.better_than(&b) && b.better_than(&a)));
        }

        #[test]
        fn test_feasibility_dominates(a in arb_evaluation(), b in arb_evaluation()) {
            if a.is_infeasible() && !b.is_infeasible() {
                prop_assert!(b.better_than(&a));
            }
        }

        #[test]
        fn test_better_implies_better_or_equal(a in arb_evaluation(), b in arb_evaluation()) {
            if a.better_than(&b) {
                prop_assert!(a.better_or_equal_to(&b));
            }
        }
    }
}

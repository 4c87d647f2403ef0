//! Sequences of movements applied as one.

use std::fmt::{self, Debug};

use metaforge_core::{BoxedMovement, Movement, Result};

/// Applies sub-movements in order and unapplies them in reverse.
///
/// The composite counts as applied if any sub-movement applied; only
/// the sub-movements that did apply are reverted. Its cost is the
/// override when set, otherwise the sum of the sub-costs.
///
/// # Example
///
/// ```
/// use metaforge_solver::heuristic::CompositeMovement;
/// use metaforge_core::Movement;
/// use metaforge_test::{ShiftMove, VectorSolution};
///
/// let mut composite: CompositeMovement<VectorSolution> = CompositeMovement::new(vec![
///     Box::new(ShiftMove::new(0, 2)),
///     Box::new(ShiftMove::new(1, -5)),
/// ]);
/// assert_eq!(composite.cost(), -3.0);
///
/// let mut solution = VectorSolution::zeros(2);
/// assert!(composite.apply(&mut solution).unwrap());
/// assert_eq!(solution.values, vec![2, -5]);
/// composite.unapply(&mut solution).unwrap();
/// assert_eq!(solution.values, vec![0, 0]);
/// ```
pub struct CompositeMovement<S> {
    movements: Vec<BoxedMovement<S>>,
    applied: Vec<bool>,
    cost_override: Option<f64>,
}

impl<S> CompositeMovement<S> {
    pub fn new(movements: Vec<BoxedMovement<S>>) -> Self {
        let applied = vec![false; movements.len()];
        Self {
            movements,
            applied,
            cost_override: None,
        }
    }

    /// Reports `cost` instead of the sum of the sub-costs.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost_override = Some(cost);
        self
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }
}

impl<S: 'static> Movement<S> for CompositeMovement<S> {
    fn name(&self) -> &'static str {
        "CompositeMovement"
    }

    fn cost(&self) -> f64 {
        self.cost_override
            .unwrap_or_else(|| self.movements.iter().map(|m| m.cost()).sum())
    }

    fn apply(&mut self, solution: &mut S) -> Result<bool> {
        let mut any = false;
        for (movement, applied) in self.movements.iter_mut().zip(self.applied.iter_mut()) {
            *applied = movement.apply(solution)?;
            any |= *applied;
        }
        Ok(any)
    }

    fn unapply(&mut self, solution: &mut S) -> Result<()> {
        for (movement, applied) in self
            .movements
            .iter_mut()
            .zip(self.applied.iter_mut())
            .rev()
        {
            if *applied {
                movement.unapply(solution)?;
                *applied = false;
            }
        }
        Ok(())
    }
}

impl<S> Debug for CompositeMovement<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeMovement")
            .field("movements", &self.movements)
            .field("cost_override", &self.cost_override)
            .finish()
    }
}

//! Movement contract.

use std::fmt::Debug;

use crate::error::Result;

/// An invertible mutation of a solution, carrying a cost.
///
/// A movement is produced by a neighborhood for one solution snapshot and
/// must only be applied to that solution. Its lifecycle is
/// `created -> applied -> (accepted | unapplied)`; the engine drives the
/// transitions and never applies a movement twice.
///
/// `cost` must be callable before `apply` and must describe the change
/// the movement is about to make.
pub trait Movement<S>: Send + Debug {
    /// Name used in logs and telemetry.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Expected objective change of applying this movement.
    fn cost(&self) -> f64;

    /// Applies the movement.
    ///
    /// Returns `Ok(false)` if the movement turned out not to be applicable,
    /// in which case `solution` must be unchanged. An `Err` is a defect in
    /// the movement and aborts the current search attempt.
    fn apply(&mut self, solution: &mut S) -> Result<bool>;

    /// Reverts a previously successful [`Movement::apply`].
    fn unapply(&mut self, solution: &mut S) -> Result<()>;
}

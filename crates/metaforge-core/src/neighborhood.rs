//! Neighborhood contract.

use std::fmt::Debug;

use crate::error::Result;
use crate::movement::Movement;
use crate::threads::ThreadRandom;

/// Boxed movement as yielded by neighborhoods.
pub type BoxedMovement<S> = Box<dyn Movement<S>>;

/// Generator of candidate movements reachable from a solution.
///
/// `build` prepares candidates for one snapshot; `next_move` then yields
/// them one at a time until it returns `None`. The sequence is not
/// restartable: the neighborhood has to be built again.
pub trait Neighborhood<S>: Send + Debug {
    /// Name used in logs and telemetry.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Prepares candidates for `solution`; false if none can be built.
    fn build(&mut self, random: &ThreadRandom<'_>, solution: &S) -> Result<bool>;

    /// Yields the next candidate, or `None` once the sequence is exhausted.
    fn next_move(&mut self, random: &ThreadRandom<'_>) -> Result<Option<BoxedMovement<S>>>;

    /// Drops cached indices after `solution` changed outside this neighborhood.
    fn reset(&mut self, _solution: &S) {}

    /// Marks the last yielded movement as consumed and clears per-move state.
    fn accept_movement(&mut self) {}

    /// Deep, independent copy for use on another thread.
    fn box_clone(&self) -> Box<dyn Neighborhood<S>>;
}

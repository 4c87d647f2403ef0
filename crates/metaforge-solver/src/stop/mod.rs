//! Stop criteria for search loops.
//!
//! Criteria are shared by reference along the [`SearchContext`] chain,
//! including across worker threads, so every operation takes `&self` and
//! implementations keep their counters behind atomics or a mutex.
//!
//! [`SearchContext`]: crate::context::SearchContext

mod no_improvement;
mod time_iteration;

use std::fmt::Debug;

use metaforge_core::Evaluation;

pub use no_improvement::StopNoImprovement;
pub use time_iteration::StopTimeIteration;

/// Decides when a search loop terminates.
pub trait StopCriteria: Send + Sync + Debug {
    /// Returns true if the search should stop.
    fn stop(&self) -> bool;

    /// Stop check that also sees the latest evaluations of the search.
    ///
    /// The first evaluation is the one the criteria tracks.
    fn stop_on_evaluations(&self, _evaluations: &[Evaluation]) -> bool {
        self.stop()
    }

    /// Advances the iteration counter by one.
    fn increment_counter(&self);

    /// Restarts the clock and zeroes every counter.
    fn reset(&self);

    /// Fraction of the budget used, in `[0, 1]`.
    fn progress(&self) -> f64 {
        0.0
    }

    /// Human-readable status line.
    fn current_status(&self) -> String;

    /// Independent copy in its initial state.
    fn box_clone(&self) -> Box<dyn StopCriteria>;
}

#[cfg(test)]
mod tests;

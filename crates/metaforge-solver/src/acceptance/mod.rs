//! Acceptance criteria for candidate solutions.
//!
//! A criteria compares the evaluation of the current solution with the
//! evaluation of a candidate and decides whether the search moves on to
//! the candidate.

mod annealing;
mod better;
mod better_unknown;
mod threshold;

use std::fmt::Debug;

use metaforge_core::{Evaluation, ThreadRandom};

pub use annealing::SimulatedAnnealing;
pub use better::{Better, BetterOrSame};
pub use better_unknown::{BetterUnknownAcceptance, KnownSolutionRate};
pub use threshold::Threshold;

/// Trait for accepting or rejecting candidate solutions.
pub trait AcceptanceCriteria<S>: Send + Debug {
    /// Returns true if the search should move from `current` to `candidate`.
    ///
    /// `random` is the stream of the calling thread, for stochastic rules.
    fn accept(
        &mut self,
        current: &Evaluation,
        candidate: &Evaluation,
        candidate_solution: &S,
        random: &ThreadRandom<'_>,
    ) -> bool;

    /// Returns the criteria to its initial state.
    fn reset(&mut self) {}

    /// Independent copy in its initial state.
    fn box_clone(&self) -> Box<dyn AcceptanceCriteria<S>>;
}

/// Iteration schedule shared by the temperature-based criteria.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LinearSchedule {
    iter_max: u64,
    step: f64,
}

impl LinearSchedule {
    fn new(t_start: f64, t_end: f64, iter_max: u64) -> metaforge_core::Result<Self> {
        use metaforge_core::MetaforgeError;

        if iter_max == 0 {
            return Err(MetaforgeError::Configuration(
                "iter_max must be at least 1".to_string(),
            ));
        }
        if !t_start.is_finite() || !t_end.is_finite() {
            return Err(MetaforgeError::Configuration(format!(
                "temperatures must be finite, got {} and {}",
                t_start, t_end
            )));
        }
        if t_end < 0.0 || t_start < t_end {
            return Err(MetaforgeError::Configuration(format!(
                "expected t_start >= t_end >= 0, got {} and {}",
                t_start, t_end
            )));
        }
        Ok(Self {
            iter_max,
            step: (t_start - t_end) / iter_max as f64,
        })
    }

    /// `(iter_max - iteration) * step`, where `step = (t_start - t_end) / iter_max`.
    ///
    /// Starts at `t_start - t_end` and reaches zero at `iter_max`.
    fn value_at(&self, iteration: u64) -> f64 {
        let remaining = self.iter_max.saturating_sub(iteration);
        remaining as f64 * self.step
    }
}

#[cfg(test)]
mod tests;

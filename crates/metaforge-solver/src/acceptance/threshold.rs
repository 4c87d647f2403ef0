//! Threshold acceptance.

use metaforge_core::{Evaluation, Result, ThreadRandom};

use super::{AcceptanceCriteria, LinearSchedule};

/// Accepts a strictly better candidate only if it improves by more than the current threshold.
///
/// The threshold is `(iter_max - curr_iter) * step` with
/// `step = (t_start - t_end) / iter_max`, so it falls linearly to zero over
/// `iter_max` calls; every call to `accept` advances the schedule by one
/// iteration.
///
/// # Example
///
/// ```
/// use metaforge_core::{Evaluation, ThreadManager};
/// use metaforge_solver::acceptance::{AcceptanceCriteria, Threshold};
///
/// let threads = ThreadManager::single(Some(0));
/// let random = threads.random(0);
/// let mut threshold = Threshold::new(10.0, 0.0, 5).unwrap();
///
/// let current = Evaluation::from_objective(20.0);
/// // Threshold is 10 at iteration 0: an improvement of 1 is not enough.
/// assert!(!AcceptanceCriteria::<()>::accept(
///     &mut threshold, &current, &Evaluation::from_objective(19.0), &(), &random,
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct Threshold {
    schedule: LinearSchedule,
    curr_iter: u64,
}

impl Threshold {
    pub fn new(t_start: f64, t_end: f64, iter_max: u64) -> Result<Self> {
        Ok(Self {
            schedule: LinearSchedule::new(t_start, t_end, iter_max)?,
            curr_iter: 0,
        })
    }

    /// Threshold the next call compares against.
    pub fn current_threshold(&self) -> f64 {
        self.schedule.value_at(self.curr_iter)
    }

    pub fn iteration(&self) -> u64 {
        self.curr_iter
    }
}

impl<S> AcceptanceCriteria<S> for Threshold {
    fn accept(
        &mut self,
        current: &Evaluation,
        candidate: &Evaluation,
        _candidate_solution: &S,
        _random: &ThreadRandom<'_>,
    ) -> bool {
        let threshold = self.current_threshold();
        self.curr_iter = self.curr_iter.saturating_add(1);
        candidate.better_than(current) && current.objective() - candidate.objective() > threshold
    }

    fn reset(&mut self) {
        self.curr_iter = 0;
    }

    fn box_clone(&self) -> Box<dyn AcceptanceCriteria<S>> {
        Box::new(Threshold {
            schedule: self.schedule,
            curr_iter: 0,
        })
    }
}

//! Simulated annealing acceptance.

use metaforge_core::{Evaluation, Result, ThreadRandom};

use super::{AcceptanceCriteria, LinearSchedule};

/// Temperature floor used once the linear schedule reaches zero.
pub(crate) const MIN_TEMPERATURE: f64 = 1e-9;

/// Metropolis acceptance with a linearly decreasing temperature.
///
/// Strictly better candidates are always accepted. A feasible candidate
/// that is not better is accepted when a uniform draw from the calling
/// thread's stream is at most `exp(gap / T)`, where `gap` is
/// `current - candidate` (non-positive here). The temperature is
/// `(iter_max - curr_iter) * step` with `step = (t_start - t_end) / iter_max`;
/// every call advances the schedule first, so it reaches zero at `iter_max`.
///
/// The temperature is clamped to a small positive floor: the last
/// iterations then behave like [`BetterOrSame`] for feasible candidates
/// rather than dividing by zero.
///
/// [`BetterOrSame`]: super::BetterOrSame
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    schedule: LinearSchedule,
    curr_iter: u64,
}

impl SimulatedAnnealing {
    pub fn new(t_start: f64, t_end: f64, iter_max: u64) -> Result<Self> {
        Ok(Self {
            schedule: LinearSchedule::new(t_start, t_end, iter_max)?,
            curr_iter: 0,
        })
    }

    /// Temperature used by the most recent call.
    pub fn temperature(&self) -> f64 {
        self.schedule.value_at(self.curr_iter).max(MIN_TEMPERATURE)
    }

    pub fn iteration(&self) -> u64 {
        self.curr_iter
    }
}

impl<S> AcceptanceCriteria<S> for SimulatedAnnealing {
    fn accept(
        &mut self,
        current: &Evaluation,
        candidate: &Evaluation,
        _candidate_solution: &S,
        random: &ThreadRandom<'_>,
    ) -> bool {
        self.curr_iter = self.curr_iter.saturating_add(1);
        if candidate.better_than(current) {
            return true;
        }
        if candidate.is_infeasible() {
            return false;
        }
        let gap = current.objective() - candidate.objective();
        random.next_f64() <= (gap / self.temperature()).exp()
    }

    fn reset(&mut self) {
        self.curr_iter = 0;
    }

    fn box_clone(&self) -> Box<dyn AcceptanceCriteria<S>> {
        Box::new(SimulatedAnnealing {
            schedule: self.schedule,
            curr_iter: 0,
        })
    }
}

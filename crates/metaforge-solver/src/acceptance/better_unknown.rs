//! Improvement acceptance with a tabu-like escape for known solutions.

use metaforge_core::{Evaluation, MetaforgeError, Result, Solution, ThreadRandom};

use super::AcceptanceCriteria;
use crate::memory::SolutionMemory;

/// How the acceptance probability of an already known solution is computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnownSolutionRate {
    /// Constant probability.
    Fixed(f64),
    /// `factor / counter^0.1`, decaying with every known candidate seen.
    Decaying(f64),
}

/// Accepts strictly better candidates, but only sometimes if they were seen before.
///
/// The shared [`SolutionMemory`] is keyed by canonical form. Every
/// accepted candidate is recorded, so later threads see it as known.
#[derive(Debug, Clone)]
pub struct BetterUnknownAcceptance {
    rate: KnownSolutionRate,
    memory: SolutionMemory,
    counter: u64,
}

impl BetterUnknownAcceptance {
    pub fn new(rate: KnownSolutionRate, memory: SolutionMemory) -> Result<Self> {
        let value = match rate {
            KnownSolutionRate::Fixed(p) | KnownSolutionRate::Decaying(p) => p,
        };
        if !(0.0..=1.0).contains(&value) {
            return Err(MetaforgeError::Configuration(format!(
                "known-solution rate must be in [0, 1], got {}",
                value
            )));
        }
        Ok(Self {
            rate,
            memory,
            counter: 0,
        })
    }

    /// Accepts a known solution with constant probability `percent`.
    pub fn fixed(percent: f64, memory: SolutionMemory) -> Result<Self> {
        Self::new(KnownSolutionRate::Fixed(percent), memory)
    }

    /// Accepts a known solution with probability `factor / counter^0.1`.
    pub fn decaying(factor: f64, memory: SolutionMemory) -> Result<Self> {
        Self::new(KnownSolutionRate::Decaying(factor), memory)
    }

    pub fn memory(&self) -> &SolutionMemory {
        &self.memory
    }

    fn accept_known(&mut self, random: &ThreadRandom<'_>) -> bool {
        self.counter += 1;
        let target = match self.rate {
            KnownSolutionRate::Fixed(p) => p,
            KnownSolutionRate::Decaying(factor) => factor / (self.counter as f64).powf(0.1),
        };
        random.next_f64() < target
    }
}

impl<S: Solution> AcceptanceCriteria<S> for BetterUnknownAcceptance {
    fn accept(
        &mut self,
        current: &Evaluation,
        candidate: &Evaluation,
        candidate_solution: &S,
        random: &ThreadRandom<'_>,
    ) -> bool {
        if !candidate.better_than(current) {
            return false;
        }
        let canonical = candidate_solution.canonical_form();
        let accepted = !self.memory.contains(&canonical) || self.accept_known(random);
        if accepted {
            self.memory.insert(canonical, candidate.objective());
        }
        accepted
    }

    fn reset(&mut self) {
        self.counter = 0;
    }

    fn box_clone(&self) -> Box<dyn AcceptanceCriteria<S>> {
        Box::new(BetterUnknownAcceptance {
            rate: self.rate,
            memory: self.memory.clone(),
            counter: 0,
        })
    }
}

//! Improvement-only acceptance.

use metaforge_core::{Evaluation, ThreadRandom};

use super::AcceptanceCriteria;

/// Accepts only strictly better candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Better;

impl Better {
    pub fn new() -> Self {
        Self
    }
}

impl<S> AcceptanceCriteria<S> for Better {
    fn accept(
        &mut self,
        current: &Evaluation,
        candidate: &Evaluation,
        _candidate_solution: &S,
        _random: &ThreadRandom<'_>,
    ) -> bool {
        candidate.better_than(current)
    }

    fn box_clone(&self) -> Box<dyn AcceptanceCriteria<S>> {
        Box::new(*self)
    }
}

/// Accepts candidates that are better or equally good, allowing sideways moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct BetterOrSame;

impl BetterOrSame {
    pub fn new() -> Self {
        Self
    }
}

impl<S> AcceptanceCriteria<S> for BetterOrSame {
    fn accept(
        &mut self,
        current: &Evaluation,
        candidate: &Evaluation,
        _candidate_solution: &S,
        _random: &ThreadRandom<'_>,
    ) -> bool {
        candidate.better_or_equal_to(current)
    }

    fn box_clone(&self) -> Box<dyn AcceptanceCriteria<S>> {
        Box::new(*self)
    }
}

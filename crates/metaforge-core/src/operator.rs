//! Genetic operators.

use std::fmt::Debug;

use crate::error::Result;
use crate::evaluation::Evaluation;
use crate::threads::ThreadRandom;

/// Picks a parent out of a population.
pub trait Selection<S>: Send + Debug {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the index of the chosen member.
    ///
    /// `evaluations[i]` is the evaluation of `population[i]`; the population
    /// is never empty.
    fn select(
        &mut self,
        population: &[S],
        evaluations: &[Evaluation],
        random: &ThreadRandom<'_>,
    ) -> Result<usize>;

    fn box_clone(&self) -> Box<dyn Selection<S>>;
}

/// Combines two parents into an offspring.
pub trait CrossOver<S>: Send + Debug {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn cross(&mut self, first: &S, second: &S, random: &ThreadRandom<'_>) -> Result<S>;

    fn box_clone(&self) -> Box<dyn CrossOver<S>>;
}

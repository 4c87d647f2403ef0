//! Genetic operator fixtures.

use metaforge_core::{CrossOver, Result, ThreadRandom};

use crate::vector::VectorSolution;

/// Takes each position from either parent with equal probability.
#[derive(Debug, Clone, Default)]
pub struct UniformCrossOver;

impl CrossOver<VectorSolution> for UniformCrossOver {
    fn name(&self) -> &'static str {
        "UniformCrossOver"
    }

    fn cross(
        &mut self,
        first: &VectorSolution,
        second: &VectorSolution,
        random: &ThreadRandom<'_>,
    ) -> Result<VectorSolution> {
        let values = first
            .values
            .iter()
            .zip(&second.values)
            .map(|(a, b)| if random.next_f64() < 0.5 { *a } else { *b })
            .collect();
        Ok(VectorSolution::new(values))
    }

    fn box_clone(&self) -> Box<dyn CrossOver<VectorSolution>> {
        Box::new(self.clone())
    }
}

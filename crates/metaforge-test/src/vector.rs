//! Integer-vector solution fixtures.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use metaforge_core::{
    Constraint, ConstraintEvaluation, ConstraintEvaluator, ConstraintKind, Result, Solution,
};

/// A vector of integers; the fixtures minimize functions of its values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VectorSolution {
    pub values: Vec<i64>,
}

impl VectorSolution {
    pub fn new(values: Vec<i64>) -> Self {
        Self { values }
    }

    pub fn zeros(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    pub fn sum(&self) -> i64 {
        self.values.iter().sum()
    }
}

impl Solution for VectorSolution {
    fn solution_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.values.hash(&mut hasher);
        hasher.finish()
    }

    fn canonical_form(&self) -> String {
        let parts: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        format!("[{}]", parts.join(","))
    }

    fn dissimilarity(&self, other: &Self) -> f64 {
        let common: i64 = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a - b).abs())
            .sum();
        let length_gap = self.values.len().abs_diff(other.values.len());
        (common as f64) + length_gap as f64
    }

    fn decompose(&self, parts: usize) -> Result<Vec<Self>> {
        let parts = parts.max(1);
        let chunk = self.values.len().div_ceil(parts).max(1);
        Ok(self
            .values
            .chunks(chunk)
            .map(|c| VectorSolution::new(c.to_vec()))
            .collect())
    }

    fn merge(parts: &[Self]) -> Result<Self> {
        Ok(VectorSolution::new(
            parts.iter().flat_map(|p| p.values.iter().copied()).collect(),
        ))
    }
}

/// Objective: the sum of all values.
pub fn sum_evaluator() -> ConstraintEvaluator<VectorSolution> {
    ConstraintEvaluator::new(|s: &VectorSolution| s.sum() as f64)
}

/// Objective: the L1 distance of every value to `target`.
pub fn distance_evaluator(target: i64) -> ConstraintEvaluator<VectorSolution> {
    ConstraintEvaluator::new(move |s: &VectorSolution| {
        s.values.iter().map(|v| (v - target).abs()).sum::<i64>() as f64
    })
}

/// Infeasible when any value exceeds `max`; penalty is the total excess.
#[derive(Debug, Clone)]
pub struct UpperBound {
    kind: ConstraintKind,
    max: i64,
}

impl UpperBound {
    pub fn new(max: i64) -> Self {
        Self {
            kind: ConstraintKind::new("upper_bound"),
            max,
        }
    }
}

impl Constraint<VectorSolution> for UpperBound {
    fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    fn evaluate(&self, solution: &VectorSolution) -> ConstraintEvaluation {
        let excess: i64 = solution.values.iter().map(|v| (v - self.max).max(0)).sum();
        ConstraintEvaluation::new(self.kind.clone(), excess > 0, excess as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_then_merge_restores_solution() {
        let original = VectorSolution::new(vec![4, -1, 7, 0, 3]);
        for parts in 1..=6 {
            let pieces = original.decompose(parts).unwrap();
            assert!(pieces.len() <= parts);
            assert_eq!(VectorSolution::merge(&pieces).unwrap(), original);
        }
    }

    #[test]
    fn test_decompose_splits_into_contiguous_chunks() {
        let pieces = VectorSolution::new(vec![1, 2, 3, 4, 5]).decompose(2).unwrap();
        assert_eq!(
            pieces,
            vec![VectorSolution::new(vec![1, 2, 3]), VectorSolution::new(vec![4, 5])]
        );
    }

    #[test]
    fn test_decompose_zero_parts_keeps_one_piece() {
        let original = VectorSolution::new(vec![8, 9]);
        assert_eq!(original.decompose(0).unwrap(), vec![original.clone()]);
    }
}

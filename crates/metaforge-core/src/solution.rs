//! The candidate solution contract.

use std::fmt::Debug;

use crate::error::{MetaforgeError, Result};

/// A problem-specific candidate answer.
///
/// The engine never looks inside a solution. Everything it needs comes
/// through this trait: copies for per-thread isolation, a structural hash
/// for duplicate detection in pools, a canonical string for the shared
/// seen-solution table, and a dissimilarity measure for diversity scoring.
///
/// `Clone` is the copy operation and must be deep: two clones never share
/// mutable state.
pub trait Solution: Clone + Send + Sync + Debug + 'static {
    /// Stable structural hash. Equal structures must hash equal.
    fn solution_hash(&self) -> u64;

    /// Canonical string form. Equal structures must produce equal strings.
    fn canonical_form(&self) -> String;

    /// Non-negative dissimilarity against another solution.
    fn dissimilarity(&self, other: &Self) -> f64;

    /// Splits the solution into independent parts.
    fn decompose(&self, _parts: usize) -> Result<Vec<Self>> {
        Err(MetaforgeError::Unsupported {
            operation: "decompose",
        })
    }

    /// Rebuilds a solution from parts produced by [`Solution::decompose`].
    fn merge(_parts: &[Self]) -> Result<Self> {
        Err(MetaforgeError::Unsupported { operation: "merge" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Label(u64);

    impl Solution for Label {
        fn solution_hash(&self) -> u64 {
            self.0
        }

        fn canonical_form(&self) -> String {
            self.0.to_string()
        }

        fn dissimilarity(&self, other: &Self) -> f64 {
            self.0.abs_diff(other.0) as f64
        }
    }

    #[test]
    fn test_decompose_is_unsupported_by_default() {
        let err = Label(3).decompose(2).unwrap_err();
        assert!(matches!(
            err,
            MetaforgeError::Unsupported {
                operation: "decompose"
            }
        ));
    }

    #[test]
    fn test_merge_is_unsupported_by_default() {
        let err = Label::merge(&[Label(1), Label(2)]).unwrap_err();
        assert!(matches!(
            err,
            MetaforgeError::Unsupported { operation: "merge" }
        ));
        assert_eq!(err.to_string(), "Unsupported operation: merge");
    }
}

//! Error types for MetaForge

use thiserror::Error;

/// Main error type for MetaForge operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetaforgeError {
    /// Malformed component parameters, detected at construction
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A selection or neighborhood was queried after running out of candidates
    #[error("{component} is exhausted")]
    Exhausted {
        /// Name of the exhausted component.
        component: String,
    },

    /// The solution representation does not implement this operation
    #[error("Unsupported operation: {operation}")]
    Unsupported {
        /// Name of the unsupported operation.
        operation: &'static str,
    },

    /// An incremental evaluation diverged from a full recomputation
    #[error("Evaluation inconsistency: expected objective {expected}, got {actual}")]
    EvaluationInconsistency {
        /// Objective computed from scratch.
        expected: f64,
        /// Objective reported incrementally.
        actual: f64,
    },

    /// A movement or neighborhood reported a defect while being applied
    #[error("Movement {movement} failed: {message}")]
    Movement {
        /// Name of the failing movement.
        movement: String,
        /// Description of the failure.
        message: String,
    },

    /// A parallel worker could not produce a result
    #[error("Worker failed: {0}")]
    WorkerFailed(String),
}

impl MetaforgeError {
    /// Creates an exhaustion error for the named component.
    pub fn exhausted(component: impl Into<String>) -> Self {
        MetaforgeError::Exhausted {
            component: component.into(),
        }
    }

    /// Creates a movement failure for the named movement.
    pub fn movement(movement: impl Into<String>, message: impl Into<String>) -> Self {
        MetaforgeError::Movement {
            movement: movement.into(),
            message: message.into(),
        }
    }

    /// Returns true for the end-of-candidates signal that run loops treat as normal.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, MetaforgeError::Exhausted { .. })
    }
}

/// Result type alias for MetaForge operations
pub type Result<T> = std::result::Result<T, MetaforgeError>;

//! Cross-thread table of previously seen solutions.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::{Arc, PoisonError, RwLock};

/// Best-effort shared record of canonical solution forms and their objective.
///
/// Clones share the same table. Concurrent readers may miss an insert that
/// races with them; consumers use the table only as a heuristic.
#[derive(Clone, Default)]
pub struct SolutionMemory {
    seen: Arc<RwLock<HashMap<String, f64>>>,
}

impl SolutionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.seen
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(canonical)
    }

    /// Objective recorded for `canonical`, if any.
    pub fn get(&self, canonical: &str) -> Option<f64> {
        self.seen
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(canonical)
            .copied()
    }

    pub fn insert(&self, canonical: String, objective: f64) {
        self.seen
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(canonical, objective);
    }

    pub fn len(&self) -> usize {
        self.seen.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.seen
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Debug for SolutionMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionMemory")
            .field("len", &self.len())
            .finish()
    }
}
